use crate::{
    api::{admission, attendance, id_card, result},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters, built once so every worker shares the same buckets.
#[derive(Clone)]
pub struct Limiters {
    scan: Limiter,
    admission: Limiter,
    lookup: Limiter,
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            scan: Arc::new(build_limiter(config.rate_scan_per_min)?),
            admission: Arc::new(build_limiter(config.rate_admission_per_min)?),
            lookup: Arc::new(build_limiter(config.rate_lookup_per_min)?),
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests/min"))?;

    Ok(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/attendance")
                    // /attendance/scan
                    .service(
                        web::resource("/scan")
                            .wrap(limiters.scan.clone())
                            .route(web::post().to(attendance::scan)),
                    )
                    // /attendance?date=
                    .service(
                        web::resource("")
                            .wrap(limiters.lookup.clone())
                            .route(web::get().to(attendance::list_attendance)),
                    ),
            )
            .service(
                web::scope("/admissions")
                    // /admissions
                    .service(
                        web::resource("")
                            .wrap(limiters.admission.clone())
                            .route(web::post().to(admission::create_admission)),
                    )
                    // /admissions/options
                    .service(
                        web::resource("/options")
                            .route(web::get().to(admission::admission_options)),
                    ),
            )
            .service(
                web::resource("/results")
                    .wrap(limiters.lookup.clone())
                    .route(web::get().to(result::get_result)),
            )
            .service(
                web::resource("/id-card")
                    .wrap(limiters.lookup.clone())
                    .route(web::post().to(id_card::generate_id_card)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_extreme_rates() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(1).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }
}

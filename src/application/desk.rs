use crate::application::pipeline::{PaymentOutcome, PaymentPipeline};
use crate::domain::amount::Balance;
use crate::domain::session::Session;
use crate::error::{PaymentError, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Call-site guard around a [`PaymentPipeline`].
///
/// Only one attempt may be in flight at a time, and attempts that pass
/// validation are throttled to one per configured cooldown.
pub struct PaymentDesk {
    pipeline: PaymentPipeline,
    in_flight: AtomicBool,
    limiter: DefaultDirectRateLimiter,
}

impl PaymentDesk {
    pub fn new(pipeline: PaymentPipeline) -> Self {
        let quota = Quota::with_period(pipeline.config().submit_cooldown)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::MIN);
        Self {
            pipeline,
            in_flight: AtomicBool::new(false),
            limiter: RateLimiter::direct(quota),
        }
    }

    pub fn pipeline(&self) -> &PaymentPipeline {
        &self.pipeline
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit(
        &self,
        session: Option<&Session>,
        balance: Option<Balance>,
        destination: &str,
        amount: &str,
    ) -> Result<PaymentOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PaymentError::PaymentInFlight);
        }
        let _guard = scopeguard::guard((), |_| {
            self.in_flight.store(false, Ordering::Release);
        });

        // input mistakes go straight to the pipeline without spending the cooldown
        let valid = self
            .pipeline
            .validate(session, balance, destination, amount)
            .is_ok();
        if valid && self.limiter.check().is_err() {
            warn!("payment submission throttled");
            return Err(PaymentError::RateLimited);
        }

        self.pipeline
            .submit(session, balance, destination, amount)
            .await
    }
}

// libs/appointment-cell/src/services/pricing.rs
use tracing::debug;

use specialist_cell::Specialist;

use crate::models::{Appointment, PriceQuote};

pub const CURRENCY: &str = "gbp";

#[derive(Debug, Default, Clone, Copy)]
pub struct PricingService;

impl PricingService {
    pub fn new() -> Self {
        Self
    }

    /// One booking costs one session at the specialist's price, whatever its length.
    pub fn quote(&self, appointment: &Appointment, specialist: &Specialist) -> PriceQuote {
        let quote = PriceQuote {
            appointment_id: appointment.id,
            amount_pence: specialist.session_price_pence,
            currency: CURRENCY.to_string(),
            description: format!(
                "Appointment with {} on {} at {}",
                specialist.name,
                appointment.date.format("%Y-%m-%d"),
                appointment.start_time.format("%H:%M"),
            ),
        };
        debug!("Quoted {} for appointment {}", quote.display_amount(), appointment.id);
        quote
    }
}

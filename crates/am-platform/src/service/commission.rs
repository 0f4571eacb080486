//! Commission split
//!
//! Every attributed sale is divided three ways. The creator receives the
//! product's commission percentage, the store owner keeps the rest, and the
//! platform takes a flat fee charged half to each side.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::warn;

use crate::error::{PlatformError, Result};

/// Flat fee per sale
pub const PLATFORM_FEE: Decimal = dec!(1.00);

/// Portion of the fee borne by each party
pub const FEE_SHARE: Decimal = dec!(0.50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionSplit {
    pub sale_amount: Decimal,
    pub commission_rate: Decimal,
    pub commission_amount: Decimal,
    pub platform_fee: Decimal,
    pub creator_earnings: Decimal,
    pub store_owner_earnings: Decimal,
}

impl CommissionSplit {
    /// Split `sale_amount` at `commission_rate` percent.
    ///
    /// Only the commission is rounded (to cents, half away from zero); both
    /// earnings are derived from it so that
    /// `creator + store owner + fee == sale` holds exactly.
    pub fn compute(sale_amount: Decimal, commission_rate: Decimal) -> Result<Self> {
        if sale_amount < Decimal::ZERO {
            return Err(PlatformError::validation(format!(
                "Sale amount must not be negative, got {}",
                sale_amount
            )));
        }
        if commission_rate < Decimal::ZERO || commission_rate > dec!(100) {
            return Err(PlatformError::validation(format!(
                "Commission rate must be between 0 and 100, got {}",
                commission_rate
            )));
        }

        let commission_amount = sale_amount
            .checked_mul(commission_rate)
            .and_then(|amount| amount.checked_div(dec!(100)))
            .map(to_cents)
            .ok_or_else(|| {
                PlatformError::validation(format!(
                    "Commission on {} at {}% is out of range",
                    sale_amount, commission_rate
                ))
            })?;
        let creator_earnings = commission_amount - FEE_SHARE;
        let store_owner_earnings = sale_amount - commission_amount - FEE_SHARE;

        if creator_earnings < Decimal::ZERO {
            warn!(
                %sale_amount,
                %commission_rate,
                %creator_earnings,
                "Commission below fee share, creator earnings are negative"
            );
        }

        Ok(Self {
            sale_amount,
            commission_rate,
            commission_amount,
            platform_fee: PLATFORM_FEE,
            creator_earnings,
            store_owner_earnings,
        })
    }
}

fn to_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

//! # Quotation Cost Model
//!
//! Converts print parameters into a price breakdown.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cost Model                                        │
//! │                                                                         │
//! │  hours + minutes/60 ──► print_time_hours                                │
//! │                                                                         │
//! │  weight × cost/g ────────────────────────► ceil ─► material ─┐          │
//! │  hours × (W/1000) × cost/kWh ────────────► ceil ─► energy ───┤          │
//! │  hours × wear/h ─────────────────────────► ceil ─► wear ─────┼─► subtotal
//! │  hours × labor/h ────────────────────────► ceil ─► labor ────┘          │
//! │                                                                         │
//! │  subtotal × margin% ─► ceil ─► margin_amount                            │
//! │  subtotal + margin_amount = net                                         │
//! │  net × tax% ─────────► ceil ─► tax_amount                               │
//! │  net + tax_amount = final_price                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every currency step rounds UP to a whole unit, so the shop never quotes
//! below cost because of truncation. Tax is applied on top of the margin.
//!
//! The calculator never fails: it passes whatever numbers it receives
//! through the formulas. Rejecting negative inputs is the job of
//! [`crate::validation::validate_quotation_input`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Machine;

// =============================================================================
// Input / Output
// =============================================================================

/// Numeric inputs of a quotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuotationInput {
    pub product_name: String,
    pub weight_grams: f64,
    pub print_hours: f64,
    pub print_minutes: f64,
    pub material_cost_per_gram: f64,
    pub machine_power_watts: f64,
    pub energy_cost_per_kwh: f64,
    pub wear_cost_per_hour: f64,
    pub labor_cost_per_hour: f64,
    pub tax_percent: f64,
    pub margin_percent: f64,
}

impl QuotationInput {
    /// Total print duration in minutes.
    pub fn print_duration_minutes(&self) -> f64 {
        self.print_hours * 60.0 + self.print_minutes
    }

    /// Total print duration in (fractional) hours.
    pub fn print_time_hours(&self) -> f64 {
        self.print_hours + self.print_minutes / 60.0
    }
}

/// Price breakdown produced by [`calculate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuotationResult {
    pub material_cost: Money,
    pub energy_cost: Money,
    pub wear_cost: Money,
    pub labor_cost: Money,
    pub subtotal: Money,
    pub margin_amount: Money,
    pub tax_amount: Money,
    pub final_price: Money,
}

// =============================================================================
// Calculation
// =============================================================================

/// Runs the cost model.
///
/// ## Example
/// ```rust
/// use filamento_core::quotation::{calculate, QuotationInput};
///
/// let input = QuotationInput {
///     weight_grams: 100.0,
///     print_hours: 1.0,
///     print_minutes: 30.0,
///     material_cost_per_gram: 0.025,
///     machine_power_watts: 150.0,
///     energy_cost_per_kwh: 140.0,
///     wear_cost_per_hour: 200.0,
///     labor_cost_per_hour: 100.0,
///     tax_percent: 19.0,
///     margin_percent: 300.0,
///     ..Default::default()
/// };
///
/// let r = calculate(&input);
/// assert_eq!(r.subtotal.units(), 485);
/// assert_eq!(r.final_price.units(), 2309);
/// ```
pub fn calculate(input: &QuotationInput) -> QuotationResult {
    let hours = input.print_time_hours();
    let machine_power_kw = input.machine_power_watts / 1000.0;

    // Left-to-right evaluation order matters for the float result.
    let material_cost = Money::ceil_from(input.weight_grams * input.material_cost_per_gram);
    let energy_cost = Money::ceil_from(hours * machine_power_kw * input.energy_cost_per_kwh);
    let wear_cost = Money::ceil_from(hours * input.wear_cost_per_hour);
    let labor_cost = Money::ceil_from(hours * input.labor_cost_per_hour);

    let subtotal = material_cost + energy_cost + wear_cost + labor_cost;
    let margin_amount = subtotal.percentage_ceil(input.margin_percent);
    let net_total = subtotal + margin_amount;
    let tax_amount = net_total.percentage_ceil(input.tax_percent);
    let final_price = net_total + tax_amount;

    QuotationResult {
        material_cost,
        energy_cost,
        wear_cost,
        labor_cost,
        subtotal,
        margin_amount,
        tax_amount,
        final_price,
    }
}

/// Cost per gram of a filament roll, rounded to 4 decimals.
///
/// Returns `None` when the roll weight is not positive or either value is
/// not finite.
///
/// ```rust
/// use filamento_core::quotation::material_cost_per_gram_from_roll;
///
/// assert_eq!(material_cost_per_gram_from_roll(25_000.0, 1000.0), Some(25.0));
/// assert_eq!(material_cost_per_gram_from_roll(25_000.0, 0.0), None);
/// ```
pub fn material_cost_per_gram_from_roll(roll_cost: f64, roll_weight: f64) -> Option<f64> {
    if !roll_cost.is_finite() || !roll_weight.is_finite() || roll_weight <= 0.0 {
        return None;
    }
    Some(((roll_cost / roll_weight) * 10_000.0).round() / 10_000.0)
}

// =============================================================================
// Defaults
// =============================================================================

/// Pre-filled values of a fresh quotation form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuotationDefaults {
    pub machine_power_watts: f64,
    pub energy_cost_per_kwh: f64,
    pub wear_cost_per_hour: f64,
    pub labor_cost_per_hour: f64,
    pub tax_percent: f64,
    pub margin_percent: f64,
}

impl Default for QuotationDefaults {
    fn default() -> Self {
        QuotationDefaults {
            machine_power_watts: 150.0,
            energy_cost_per_kwh: 140.0,
            wear_cost_per_hour: 200.0,
            labor_cost_per_hour: 100.0,
            tax_percent: 19.0,
            margin_percent: 300.0,
        }
    }
}

// =============================================================================
// Form
// =============================================================================

/// The quotation form as typed in, before any parsing.
///
/// Fields are kept as text so a half-filled form still calculates: anything
/// empty, non-numeric or non-finite counts as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuotationForm {
    pub product_name: String,
    pub weight: String,
    pub print_hours: String,
    pub print_minutes: String,
    pub material_cost_per_gram: String,
    pub roll_weight: String,
    pub roll_cost: String,
    pub machine_id: Option<String>,
    pub machine_power: String,
    pub energy_cost_per_kwh: String,
    pub wear_cost_per_hour: String,
    pub labor_cost_per_hour: String,
    pub tax_percent: String,
    pub margin_percent: String,
}

impl QuotationForm {
    /// A blank form seeded with the shop's default rates.
    pub fn with_defaults(defaults: &QuotationDefaults) -> Self {
        QuotationForm {
            machine_power: defaults.machine_power_watts.to_string(),
            energy_cost_per_kwh: defaults.energy_cost_per_kwh.to_string(),
            wear_cost_per_hour: defaults.wear_cost_per_hour.to_string(),
            labor_cost_per_hour: defaults.labor_cost_per_hour.to_string(),
            tax_percent: defaults.tax_percent.to_string(),
            margin_percent: defaults.margin_percent.to_string(),
            ..Default::default()
        }
    }

    /// Sets the roll weight and recomputes cost per gram when possible.
    pub fn set_roll_weight(&mut self, value: &str) {
        self.roll_weight = value.to_string();
        self.sync_cost_per_gram();
    }

    /// Sets the roll cost and recomputes cost per gram when possible.
    pub fn set_roll_cost(&mut self, value: &str) {
        self.roll_cost = value.to_string();
        self.sync_cost_per_gram();
    }

    /// Copies a machine's power rating into the form.
    pub fn select_machine(&mut self, machine: &Machine) {
        self.machine_id = Some(machine.id.clone());
        self.machine_power = machine.power_consumption_watts.to_string();
    }

    /// Parses every field leniently.
    pub fn to_input(&self) -> QuotationInput {
        QuotationInput {
            product_name: self.product_name.trim().to_string(),
            weight_grams: lenient(&self.weight),
            print_hours: lenient(&self.print_hours),
            print_minutes: lenient(&self.print_minutes),
            material_cost_per_gram: lenient(&self.material_cost_per_gram),
            machine_power_watts: lenient(&self.machine_power),
            energy_cost_per_kwh: lenient(&self.energy_cost_per_kwh),
            wear_cost_per_hour: lenient(&self.wear_cost_per_hour),
            labor_cost_per_hour: lenient(&self.labor_cost_per_hour),
            tax_percent: lenient(&self.tax_percent),
            margin_percent: lenient(&self.margin_percent),
        }
    }

    fn sync_cost_per_gram(&mut self) {
        if self.roll_cost.trim().is_empty() || self.roll_weight.trim().is_empty() {
            return;
        }
        if let Some(per_gram) =
            material_cost_per_gram_from_roll(lenient(&self.roll_cost), lenient(&self.roll_weight))
        {
            self.material_cost_per_gram = format!("{:.4}", per_gram);
        }
    }
}

/// Parses the longest leading decimal of `raw`, so `"12g"` reads as 12.
///
/// A comma works as the decimal separator (`"0,03"`), matching how
/// prices are typed in es-CL. No leading number at all reads as 0.
fn lenient(raw: &str) -> f64 {
    let normalized = raw.trim().replace(',', ".");
    let bytes = normalized.as_bytes();

    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    end = digits_from(end);
    if bytes.get(end) == Some(&b'.') {
        end = digits_from(end + 1);
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    normalized[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

// =============================================================================
// Unit Tests
// =============================================================================

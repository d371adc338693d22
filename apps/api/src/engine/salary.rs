//! Salary Calculator — computes the full compensation breakdown for an offer.
//!
//! Flow: resolve company type → default structure (loaded once) → merge policy
//! overrides field-by-field → earnings → gross → employee deductions → net →
//! employer contributions → CTC → benefit line items.
//!
//! Annual amounts are canonical. Every component is computed annually and
//! rounded to two decimals; `monthly` is always `annual / 12`.
//!
//! The calculator never fails. Input problems are reported separately by
//! [`validate_salary_data`]; missing policy fields fall back to defaults.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::engine::placeholders::resolve;
use crate::models::company::{
    BenefitKind, BenefitPolicy, CompanyPolicy, FixedAllowance, SalaryStructureOverrides,
};

// ────────────────────────────────────────────────────────────────────────────
// Company types and default structures
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    #[default]
    Corporate,
    Startup,
    Mnc,
    Sme,
    Government,
    NonProfit,
}

impl CompanyType {
    /// Parses a free-form company type. Unknown or missing values resolve to `Corporate`.
    pub fn parse(raw: Option<&str>) -> Self {
        let normalized = raw.map(|s| s.trim().to_lowercase().replace(['-', ' '], "_"));
        match normalized.as_deref() {
            None | Some("") | Some("corporate") => CompanyType::Corporate,
            Some("startup") | Some("start_up") => CompanyType::Startup,
            Some("mnc") | Some("multinational") => CompanyType::Mnc,
            Some("sme") | Some("small_business") | Some("msme") => CompanyType::Sme,
            Some("government") | Some("psu") | Some("public_sector") => CompanyType::Government,
            Some("non_profit") | Some("nonprofit") | Some("ngo") => CompanyType::NonProfit,
            Some(other) => {
                debug!("Unknown company type '{other}' — using corporate defaults");
                CompanyType::Corporate
            }
        }
    }

    pub fn default_structure(&self) -> SalaryStructure {
        DEFAULT_STRUCTURES.get(self).cloned().unwrap_or_default()
    }
}

/// Effective percentages (fractions of annual basic) and fixed annual amounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalaryStructure {
    pub hra_pct: f64,
    pub special_allowance_pct: f64,
    pub statutory_bonus_pct: f64,
    pub pf_pct: f64,
    pub esic_pct: f64,
    pub employer_pf_pct: f64,
    pub employer_esic_pct: f64,
    pub gratuity_pct: f64,
    pub insurance: f64,
    /// Fixed annual professional tax. `None` means use the location slabs.
    pub professional_tax: Option<f64>,
    #[serde(default)]
    pub fixed_allowances: Vec<FixedAllowance>,
}

impl Default for SalaryStructure {
    /// The corporate structure.
    fn default() -> Self {
        Self {
            hra_pct: 0.10,
            special_allowance_pct: 0.113,
            statutory_bonus_pct: 0.083,
            pf_pct: 0.12,
            esic_pct: 0.0075,
            employer_pf_pct: 0.12,
            employer_esic_pct: 0.0325,
            gratuity_pct: 0.0481,
            insurance: 15_000.0,
            professional_tax: None,
            fixed_allowances: Vec::new(),
        }
    }
}

impl SalaryStructure {
    /// Returns a new structure with every `Some` override replacing the default.
    /// Fixed allowances from the overrides are appended.
    pub fn merged_with(&self, overrides: &SalaryStructureOverrides) -> Self {
        let mut fixed_allowances = self.fixed_allowances.clone();
        fixed_allowances.extend(overrides.fixed_allowances.iter().cloned());
        Self {
            hra_pct: overrides.hra_pct.unwrap_or(self.hra_pct),
            special_allowance_pct: overrides
                .special_allowance_pct
                .unwrap_or(self.special_allowance_pct),
            statutory_bonus_pct: overrides
                .statutory_bonus_pct
                .unwrap_or(self.statutory_bonus_pct),
            pf_pct: overrides.pf_pct.unwrap_or(self.pf_pct),
            esic_pct: overrides.esic_pct.unwrap_or(self.esic_pct),
            employer_pf_pct: overrides.employer_pf_pct.unwrap_or(self.employer_pf_pct),
            employer_esic_pct: overrides.employer_esic_pct.unwrap_or(self.employer_esic_pct),
            gratuity_pct: overrides.gratuity_pct.unwrap_or(self.gratuity_pct),
            insurance: overrides.insurance.unwrap_or(self.insurance),
            professional_tax: overrides.professional_tax.or(self.professional_tax),
            fixed_allowances,
        }
    }
}

static DEFAULT_STRUCTURES: Lazy<HashMap<CompanyType, SalaryStructure>> = Lazy::new(|| {
    let corporate = SalaryStructure::default();
    HashMap::from([
        (CompanyType::Corporate, corporate.clone()),
        (
            CompanyType::Startup,
            SalaryStructure {
                special_allowance_pct: 0.15,
                statutory_bonus_pct: 0.0,
                insurance: 10_000.0,
                ..corporate.clone()
            },
        ),
        (
            CompanyType::Mnc,
            SalaryStructure {
                hra_pct: 0.20,
                special_allowance_pct: 0.15,
                insurance: 25_000.0,
                ..corporate.clone()
            },
        ),
        (
            CompanyType::Sme,
            SalaryStructure {
                special_allowance_pct: 0.10,
                insurance: 8_000.0,
                ..corporate.clone()
            },
        ),
        (
            CompanyType::Government,
            SalaryStructure {
                hra_pct: 0.24,
                special_allowance_pct: 0.0,
                statutory_bonus_pct: 0.0,
                esic_pct: 0.0,
                employer_esic_pct: 0.0,
                insurance: 0.0,
                ..corporate.clone()
            },
        ),
        (
            CompanyType::NonProfit,
            SalaryStructure {
                special_allowance_pct: 0.05,
                insurance: 5_000.0,
                ..corporate
            },
        ),
    ])
});

// ────────────────────────────────────────────────────────────────────────────
// Location and industry tables
// ────────────────────────────────────────────────────────────────────────────

/// One professional-tax bracket. `up_to` is an inclusive bound on annual basic;
/// `None` marks the top bracket.
#[derive(Debug, Clone, Copy)]
struct TaxSlab {
    up_to: Option<f64>,
    annual_tax: f64,
}

const fn slab(up_to: f64, annual_tax: f64) -> TaxSlab {
    TaxSlab {
        up_to: Some(up_to),
        annual_tax,
    }
}

const fn top(annual_tax: f64) -> TaxSlab {
    TaxSlab {
        up_to: None,
        annual_tax,
    }
}

/// Location keywords → slabs. Specific states come before the generic "india" entry.
static PROFESSIONAL_TAX: Lazy<Vec<(&'static [&'static str], Vec<TaxSlab>)>> = Lazy::new(|| {
    vec![
        (
            &["maharashtra", "mumbai", "pune", "nagpur"][..],
            vec![slab(90_000.0, 0.0), slab(120_000.0, 2_100.0), top(2_500.0)],
        ),
        (
            &["karnataka", "bengaluru", "bangalore", "mysuru"][..],
            vec![slab(300_000.0, 0.0), top(2_400.0)],
        ),
        (
            &["west bengal", "kolkata"][..],
            vec![
                slab(120_000.0, 0.0),
                slab(180_000.0, 1_320.0),
                slab(360_000.0, 1_800.0),
                top(2_400.0),
            ],
        ),
        (
            &["tamil nadu", "chennai", "coimbatore"][..],
            vec![slab(252_000.0, 0.0), slab(450_000.0, 1_800.0), top(2_500.0)],
        ),
        (
            &["telangana", "hyderabad"][..],
            vec![slab(180_000.0, 0.0), slab(240_000.0, 1_800.0), top(2_400.0)],
        ),
        (
            &["gujarat", "ahmedabad", "surat"][..],
            vec![slab(144_000.0, 0.0), top(2_400.0)],
        ),
        (
            &["india"][..],
            vec![slab(180_000.0, 0.0), slab(300_000.0, 1_800.0), top(2_400.0)],
        ),
    ]
});

fn benefit(name: &str, kind: BenefitKind, value: f64, description: &str) -> BenefitPolicy {
    BenefitPolicy {
        name: name.to_string(),
        kind,
        value,
        description: Some(description.to_string()),
    }
}

static INDUSTRY_BENEFITS: Lazy<Vec<(&'static [&'static str], Vec<BenefitPolicy>)>> =
    Lazy::new(|| {
        vec![
            (
                &["technology", "software", "it services", "saas"][..],
                vec![
                    benefit(
                        "Learning & Development",
                        BenefitKind::Fixed,
                        25_000.0,
                        "Annual budget for courses, certifications and conferences",
                    ),
                    benefit(
                        "Internet Reimbursement",
                        BenefitKind::Fixed,
                        12_000.0,
                        "Home broadband reimbursement",
                    ),
                ],
            ),
            (
                &["healthcare", "pharma", "hospital"][..],
                vec![benefit(
                    "Medical Cover Top-up",
                    BenefitKind::Percentage,
                    0.02,
                    "Additional family medical cover",
                )],
            ),
            (
                &["finance", "banking", "fintech", "insurance"][..],
                vec![benefit(
                    "Meal Vouchers",
                    BenefitKind::Fixed,
                    26_400.0,
                    "Tax-efficient meal card",
                )],
            ),
            (
                &["manufacturing", "automotive"][..],
                vec![benefit(
                    "Shift Allowance",
                    BenefitKind::Percentage,
                    0.05,
                    "Paid for rotational and night shifts",
                )],
            ),
            (
                &["education", "research"][..],
                vec![benefit(
                    "Research Grant",
                    BenefitKind::Fixed,
                    20_000.0,
                    "Annual research and publication support",
                )],
            ),
        ]
    });

static LOCATION_BENEFITS: Lazy<Vec<(&'static [&'static str], Vec<BenefitPolicy>)>> =
    Lazy::new(|| {
        vec![
            (
                &[
                    "mumbai",
                    "delhi",
                    "new delhi",
                    "bengaluru",
                    "bangalore",
                    "chennai",
                    "kolkata",
                    "hyderabad",
                ][..],
                vec![benefit(
                    "Metro Commute Allowance",
                    BenefitKind::Fixed,
                    19_200.0,
                    "Commute support for metro locations",
                )],
            ),
            (
                &["remote"][..],
                vec![benefit(
                    "Home Office Allowance",
                    BenefitKind::Fixed,
                    12_000.0,
                    "Workspace and equipment support for remote employees",
                )],
            ),
        ]
    });

fn matching<'a, T>(
    table: &'a [(&'static [&'static str], T)],
    needle: Option<&str>,
) -> Option<&'a T> {
    let needle = needle?.to_lowercase();
    table
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| needle.contains(k)))
        .map(|(_, value)| value)
}

/// Location-dependent step function of annual basic. Zero for unconfigured locations.
pub fn professional_tax(location: Option<&str>, annual_basic: f64) -> f64 {
    let Some(slabs) = matching(PROFESSIONAL_TAX.as_slice(), location) else {
        return 0.0;
    };
    slabs
        .iter()
        .find(|s| s.up_to.map_or(true, |limit| annual_basic <= limit))
        .map(|s| s.annual_tax)
        .unwrap_or(0.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryComponent {
    pub annual: f64,
    pub monthly: f64,
}

impl SalaryComponent {
    pub fn from_annual(annual: f64) -> Self {
        Self {
            annual,
            monthly: annual / 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitLine {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BenefitKind,
    /// Fixed annual amount, or fraction of basic for percentage benefits.
    pub value: f64,
    pub annual: f64,
    pub monthly: f64,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalarySummary {
    pub total_earnings: SalaryComponent,
    pub total_deductions: SalaryComponent,
    pub employer_contributions: SalaryComponent,
    pub benefits_value: SalaryComponent,
    pub net_take_home: SalaryComponent,
    pub ctc: SalaryComponent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryBreakdown {
    pub basic: SalaryComponent,
    pub hra: SalaryComponent,
    pub special_allowance: SalaryComponent,
    pub statutory_bonus: SalaryComponent,
    pub gross_salary: SalaryComponent,
    pub pf: SalaryComponent,
    pub esic: SalaryComponent,
    pub professional_tax: SalaryComponent,
    pub net_take_home: SalaryComponent,
    pub employer_pf: SalaryComponent,
    pub employer_esic: SalaryComponent,
    pub gratuity: SalaryComponent,
    pub insurance: SalaryComponent,
    pub ctc: SalaryComponent,
    pub benefits: Vec<BenefitLine>,
    pub summary: SalarySummary,
    pub company_type: CompanyType,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Calculation
// ────────────────────────────────────────────────────────────────────────────

fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Reads a numeric field (number or numeric string) from the candidate bag.
pub fn number_at(candidate: &Value, path: &str) -> Option<f64> {
    match resolve(candidate, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

/// Multiplier that converts candidate-supplied amounts to annual figures.
fn period_factor(candidate: &Value) -> f64 {
    match resolve(candidate, "salary_period").and_then(Value::as_str) {
        Some(p) if p.eq_ignore_ascii_case("monthly") => 12.0,
        _ => 1.0,
    }
}

/// Computes the full breakdown. Never fails: a missing or invalid base salary
/// produces a zero-basic breakdown (fixed amounts such as insurance still apply).
pub fn calculate(candidate: &Value, policy: &CompanyPolicy) -> SalaryBreakdown {
    let company_type = policy.resolved_company_type();
    let structure = company_type
        .default_structure()
        .merged_with(&policy.salary_structure);
    let factor = period_factor(candidate);

    let basic = round2(
        number_at(candidate, "base_salary")
            .filter(|b| b.is_finite() && *b > 0.0)
            .map(|b| b * factor)
            .unwrap_or(0.0),
    );

    // Pre-computed earnings override the percentage-derived ones.
    let earning = |key: &str, pct: f64| -> f64 {
        number_at(candidate, &format!("salary_components.{key}"))
            .map(|v| round2(v * factor))
            .unwrap_or_else(|| round2(basic * pct))
    };
    let hra = earning("hra", structure.hra_pct);
    let special_allowance = earning("special_allowance", structure.special_allowance_pct);
    let statutory_bonus = earning("statutory_bonus", structure.statutory_bonus_pct);
    let gross = basic + hra + special_allowance + statutory_bonus;

    let pf = round2(basic * structure.pf_pct);
    let esic = round2(basic * structure.esic_pct);
    let professional_tax = round2(
        structure
            .professional_tax
            .unwrap_or_else(|| professional_tax(policy.location.as_deref(), basic)),
    );
    let deductions = pf + esic + professional_tax;
    let net = gross - deductions;

    let employer_pf = round2(basic * structure.employer_pf_pct);
    let employer_esic = round2(basic * structure.employer_esic_pct);
    let gratuity = round2(basic * structure.gratuity_pct);
    let insurance = round2(structure.insurance);
    let employer_contributions = employer_pf + employer_esic + gratuity + insurance;
    let ctc = gross + employer_contributions;

    let benefits = benefit_lines(policy, &structure, basic);
    let benefits_value: f64 = benefits.iter().map(|b| b.annual).sum();

    debug!(
        "Salary breakdown: type={:?} basic={basic} gross={gross} ctc={ctc} benefits={}",
        company_type,
        benefits.len()
    );

    SalaryBreakdown {
        basic: SalaryComponent::from_annual(basic),
        hra: SalaryComponent::from_annual(hra),
        special_allowance: SalaryComponent::from_annual(special_allowance),
        statutory_bonus: SalaryComponent::from_annual(statutory_bonus),
        gross_salary: SalaryComponent::from_annual(gross),
        pf: SalaryComponent::from_annual(pf),
        esic: SalaryComponent::from_annual(esic),
        professional_tax: SalaryComponent::from_annual(professional_tax),
        net_take_home: SalaryComponent::from_annual(net),
        employer_pf: SalaryComponent::from_annual(employer_pf),
        employer_esic: SalaryComponent::from_annual(employer_esic),
        gratuity: SalaryComponent::from_annual(gratuity),
        insurance: SalaryComponent::from_annual(insurance),
        ctc: SalaryComponent::from_annual(ctc),
        benefits,
        summary: SalarySummary {
            total_earnings: SalaryComponent::from_annual(gross),
            total_deductions: SalaryComponent::from_annual(deductions),
            employer_contributions: SalaryComponent::from_annual(employer_contributions),
            benefits_value: SalaryComponent::from_annual(benefits_value),
            net_take_home: SalaryComponent::from_annual(net),
            ctc: SalaryComponent::from_annual(ctc),
        },
        company_type,
        currency: policy.currency_code().to_string(),
    }
}

/// Industry benefits, then location benefits, then the company's own list,
/// then fixed allowances from the salary structure.
fn benefit_lines(
    policy: &CompanyPolicy,
    structure: &SalaryStructure,
    basic: f64,
) -> Vec<BenefitLine> {
    let industry = matching(INDUSTRY_BENEFITS.as_slice(), policy.industry.as_deref())
        .map(Vec::as_slice)
        .unwrap_or_default();
    let location = matching(LOCATION_BENEFITS.as_slice(), policy.location.as_deref())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut lines: Vec<BenefitLine> = industry
        .iter()
        .chain(location)
        .chain(&policy.benefits)
        .map(|b| {
            let annual = match b.kind {
                BenefitKind::Fixed => round2(b.value),
                BenefitKind::Percentage => round2(basic * b.value),
            };
            BenefitLine {
                name: b.name.clone(),
                kind: b.kind,
                value: b.value,
                annual,
                monthly: annual / 12.0,
                description: b
                    .description
                    .clone()
                    .unwrap_or_else(|| "Company provided".to_string()),
            }
        })
        .collect();

    lines.extend(structure.fixed_allowances.iter().map(|a| {
        let annual = round2(a.amount);
        BenefitLine {
            name: a.name.clone(),
            kind: BenefitKind::Fixed,
            value: a.amount,
            annual,
            monthly: annual / 12.0,
            description: a
                .description
                .clone()
                .unwrap_or_else(|| "Company provided".to_string()),
        }
    }));

    lines
}

/// Checks the salary seed fields. Reported as a result, never thrown.
pub fn validate_salary_data(candidate: &Value) -> SalaryValidation {
    let mut errors = Vec::new();

    let base = match resolve(candidate, "base_salary") {
        None => {
            errors.push("base_salary is required".to_string());
            None
        }
        Some(_) => match number_at(candidate, "base_salary") {
            None => {
                errors.push("base_salary must be a number".to_string());
                None
            }
            Some(b) if !b.is_finite() || b <= 0.0 => {
                errors.push("base_salary must be greater than zero".to_string());
                None
            }
            Some(b) => Some(b),
        },
    };

    if resolve(candidate, "total_ctc").is_some() {
        match number_at(candidate, "total_ctc") {
            None => errors.push("total_ctc must be a number".to_string()),
            Some(ctc) => {
                if let Some(base) = base {
                    if ctc < base {
                        errors.push(format!(
                            "total_ctc ({}) cannot be less than base_salary ({})",
                            ctc, base
                        ));
                    }
                }
            }
        }
    }

    SalaryValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Display formatting
// ────────────────────────────────────────────────────────────────────────────

fn currency_symbol(code: &str) -> String {
    match code.to_uppercase().as_str() {
        "INR" => "₹".to_string(),
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        "SGD" => "S$".to_string(),
        other => format!("{other} "),
    }
}

/// Formats an amount rounded to whole units: Indian digit grouping for INR
/// (`₹12,34,567`), thousands grouping otherwise (`$1,234,567`).
pub fn format_currency(amount: f64, currency: &str) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{}", rounded.abs() as u64);
    let grouped = if currency.eq_ignore_ascii_case("INR") {
        group_indian(&digits)
    } else {
        group_thousands(&digits)
    };
    format!("{sign}{}{grouped}", currency_symbol(currency))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::with_capacity(digits.len() + digits.len() / 2);
    for (i, ch) in head.chars().enumerate() {
        if i > 0 && (head.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push(',');
    out.push_str(tail);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * b.abs().max(1.0)
    }

    #[test]
    fn test_corporate_default_gross() {
        let b = calculate(&json!({ "base_salary": 600000 }), &CompanyPolicy::default());
        assert_eq!(b.company_type, CompanyType::Corporate);
        assert_eq!(b.basic.annual, 600_000.0);
        assert_eq!(b.hra.annual, 60_000.0);
        assert_eq!(b.special_allowance.annual, 67_800.0);
        assert_eq!(b.statutory_bonus.annual, 49_800.0);
        assert!(close(b.gross_salary.annual, 777_600.0));
    }

    #[test]
    fn test_corporate_deductions_and_ctc() {
        let b = calculate(&json!({ "base_salary": 600000 }), &CompanyPolicy::default());
        assert_eq!(b.pf.annual, 72_000.0);
        assert_eq!(b.esic.annual, 4_500.0);
        // No location configured → no professional tax.
        assert_eq!(b.professional_tax.annual, 0.0);
        assert!(close(b.net_take_home.annual, 777_600.0 - 72_000.0 - 4_500.0));
        assert_eq!(b.employer_pf.annual, 72_000.0);
        assert_eq!(b.employer_esic.annual, 19_500.0);
        assert_eq!(b.gratuity.annual, 28_860.0);
        assert_eq!(b.insurance.annual, 15_000.0);
        assert!(close(
            b.ctc.annual,
            777_600.0 + 72_000.0 + 19_500.0 + 28_860.0 + 15_000.0
        ));
        assert_eq!(b.currency, "INR");
    }

    #[test]
    fn test_monthly_is_annual_over_twelve() {
        let b = calculate(&json!({ "base_salary": 1_000_000 }), &CompanyPolicy::default());
        assert!(close(b.basic.monthly * 12.0, b.basic.annual));
        assert!(close(b.ctc.monthly * 12.0, b.ctc.annual));
    }

    #[test]
    fn test_monthly_salary_period_converted_to_annual() {
        let b = calculate(
            &json!({ "base_salary": 50000, "salary_period": "monthly" }),
            &CompanyPolicy::default(),
        );
        assert_eq!(b.basic.annual, 600_000.0);
        assert!(close(b.basic.monthly, 50_000.0));
    }

    #[test]
    fn test_policy_overrides_merge_field_by_field() {
        let policy = CompanyPolicy {
            salary_structure: SalaryStructureOverrides {
                hra_pct: Some(0.40),
                ..Default::default()
            },
            ..Default::default()
        };
        let b = calculate(&json!({ "base_salary": 100000 }), &policy);
        assert_eq!(b.hra.annual, 40_000.0);
        // Untouched fields keep the corporate defaults.
        assert_eq!(b.special_allowance.annual, 11_300.0);
        assert_eq!(b.pf.annual, 12_000.0);
    }

    #[test]
    fn test_company_type_defaults() {
        let gov = CompanyPolicy {
            company_type: Some("Government".to_string()),
            ..Default::default()
        };
        let b = calculate(&json!({ "base_salary": 500000 }), &gov);
        assert_eq!(b.company_type, CompanyType::Government);
        assert_eq!(b.hra.annual, 120_000.0);
        assert_eq!(b.esic.annual, 0.0);
        assert_eq!(b.insurance.annual, 0.0);

        let startup = CompanyPolicy {
            company_type: Some("start-up".to_string()),
            ..Default::default()
        };
        assert_eq!(
            calculate(&json!({ "base_salary": 1 }), &startup).company_type,
            CompanyType::Startup
        );
        assert_eq!(CompanyType::parse(Some("conglomerate")), CompanyType::Corporate);
        assert_eq!(CompanyType::parse(Some("Startup")), CompanyType::Startup);
        assert_eq!(CompanyType::parse(Some("NGO")), CompanyType::NonProfit);
        assert_eq!(CompanyType::parse(None), CompanyType::Corporate);
    }

    #[test]
    fn test_professional_tax_slabs() {
        assert_eq!(professional_tax(Some("Mumbai, India"), 80_000.0), 0.0);
        assert_eq!(professional_tax(Some("Mumbai, India"), 100_000.0), 2_100.0);
        assert_eq!(professional_tax(Some("Mumbai, India"), 600_000.0), 2_500.0);
        assert_eq!(professional_tax(Some("Bengaluru"), 600_000.0), 2_400.0);
        assert_eq!(professional_tax(Some("Jaipur, India"), 250_000.0), 1_800.0);
        assert_eq!(professional_tax(Some("London"), 600_000.0), 0.0);
        assert_eq!(professional_tax(None, 600_000.0), 0.0);
    }

    #[test]
    fn test_fixed_professional_tax_override() {
        let policy = CompanyPolicy {
            location: Some("Mumbai".to_string()),
            salary_structure: SalaryStructureOverrides {
                professional_tax: Some(1_000.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let b = calculate(&json!({ "base_salary": 600000 }), &policy);
        assert_eq!(b.professional_tax.annual, 1_000.0);
    }

    #[test]
    fn test_industry_and_location_benefits() {
        let policy = CompanyPolicy {
            industry: Some("Technology".to_string()),
            location: Some("Bengaluru".to_string()),
            benefits: vec![BenefitPolicy {
                name: "Gym Membership".to_string(),
                kind: BenefitKind::Fixed,
                value: 6_000.0,
                description: None,
            }],
            ..Default::default()
        };
        let b = calculate(&json!({ "base_salary": 1_000_000 }), &policy);
        let names: Vec<&str> = b.benefits.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Learning & Development",
                "Internet Reimbursement",
                "Metro Commute Allowance",
                "Gym Membership"
            ]
        );
        assert_eq!(b.benefits[3].description, "Company provided");
        assert!(close(b.summary.benefits_value.annual, 25_000.0 + 12_000.0 + 19_200.0 + 6_000.0));
    }

    #[test]
    fn test_percentage_benefit_relative_to_basic() {
        let policy = CompanyPolicy {
            industry: Some("Healthcare".to_string()),
            ..Default::default()
        };
        let b = calculate(&json!({ "base_salary": 500000 }), &policy);
        assert_eq!(b.benefits.len(), 1);
        assert_eq!(b.benefits[0].annual, 10_000.0);
    }

    #[test]
    fn test_precomputed_components_override() {
        let b = calculate(
            &json!({ "base_salary": 600000, "salary_components": { "hra": 240000 } }),
            &CompanyPolicy::default(),
        );
        assert_eq!(b.hra.annual, 240_000.0);
        assert!(close(b.gross_salary.annual, 600_000.0 + 240_000.0 + 67_800.0 + 49_800.0));
    }

    #[test]
    fn test_missing_base_salary_falls_back_to_zero() {
        let b = calculate(&json!({}), &CompanyPolicy::default());
        assert_eq!(b.basic.annual, 0.0);
        assert_eq!(b.gross_salary.annual, 0.0);
        assert_eq!(b.ctc.annual, 15_000.0);
    }

    #[test]
    fn test_validate_salary_data() {
        assert!(validate_salary_data(&json!({ "base_salary": 600000, "total_ctc": 900000 })).is_valid);

        let missing = validate_salary_data(&json!({}));
        assert!(!missing.is_valid);
        assert_eq!(missing.errors, vec!["base_salary is required"]);

        let zero = validate_salary_data(&json!({ "base_salary": 0 }));
        assert_eq!(zero.errors, vec!["base_salary must be greater than zero"]);

        let text = validate_salary_data(&json!({ "base_salary": "lots" }));
        assert_eq!(text.errors, vec!["base_salary must be a number"]);

        let low_ctc = validate_salary_data(&json!({ "base_salary": 600000, "total_ctc": 500000 }));
        assert!(!low_ctc.is_valid);
        assert!(low_ctc.errors[0].contains("cannot be less than base_salary"));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1_234_567.0, "INR"), "₹12,34,567");
        assert_eq!(format_currency(777_600.0, "INR"), "₹7,77,600");
        assert_eq!(format_currency(999.0, "INR"), "₹999");
        assert_eq!(format_currency(1_234_567.4, "USD"), "$1,234,567");
        assert_eq!(format_currency(4_166.67, "EUR"), "€4,167");
        assert_eq!(format_currency(-2_500.0, "INR"), "-₹2,500");
        assert_eq!(format_currency(100.0, "CHF"), "CHF 100");
    }

    proptest! {
        #[test]
        fn prop_salary_invariants_hold(
            base in 1.0f64..50_000_000.0,
            type_idx in 0usize..6,
            hra in proptest::option::of(0.0f64..0.6),
        ) {
            let company_type = ["corporate", "startup", "mnc", "sme", "government", "non_profit"][type_idx];
            let policy = CompanyPolicy {
                company_type: Some(company_type.to_string()),
                location: Some("Pune".to_string()),
                salary_structure: SalaryStructureOverrides { hra_pct: hra, ..Default::default() },
                ..Default::default()
            };
            let b = calculate(&json!({ "base_salary": base }), &policy);

            prop_assert!(close(
                b.gross_salary.annual,
                b.basic.annual + b.hra.annual + b.special_allowance.annual + b.statutory_bonus.annual
            ));
            prop_assert!(close(
                b.net_take_home.annual,
                b.gross_salary.annual - b.pf.annual - b.esic.annual - b.professional_tax.annual
            ));
            prop_assert!(close(
                b.ctc.annual,
                b.gross_salary.annual + b.employer_pf.annual + b.employer_esic.annual
                    + b.gratuity.annual + b.insurance.annual
            ));
            for c in [b.basic, b.hra, b.gross_salary, b.net_take_home, b.ctc] {
                prop_assert!(close(c.monthly * 12.0, c.annual));
            }
        }
    }
}

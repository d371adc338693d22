use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::salary::{CompanyType, SalaryStructure};

/// Company-side input to rendering and salary calculation.
///
/// Every field is optional: missing values fall back to the defaults of the
/// resolved company type, or to neutral presentation defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPolicy {
    #[serde(default)]
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company_type: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub salary_structure: SalaryStructureOverrides,
    #[serde(default)]
    pub benefits: Vec<BenefitPolicy>,
    #[serde(default)]
    pub branding: Branding,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub employment_terms: Option<EmploymentTerms>,
    #[serde(default)]
    pub compliance: Option<ComplianceInfo>,
    #[serde(default)]
    pub offer_validity_days: Option<i64>,
}

impl CompanyPolicy {
    pub fn resolved_company_type(&self) -> CompanyType {
        CompanyType::parse(self.company_type.as_deref())
    }

    pub fn currency_code(&self) -> &str {
        self.currency.as_deref().unwrap_or("INR")
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Company")
    }
}

/// Per-company overrides merged field-by-field over the company-type defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalaryStructureOverrides {
    pub hra_pct: Option<f64>,
    pub special_allowance_pct: Option<f64>,
    pub statutory_bonus_pct: Option<f64>,
    pub pf_pct: Option<f64>,
    pub esic_pct: Option<f64>,
    pub employer_pf_pct: Option<f64>,
    pub employer_esic_pct: Option<f64>,
    pub gratuity_pct: Option<f64>,
    pub insurance: Option<f64>,
    /// Fixed annual professional tax, replacing the location slabs.
    pub professional_tax: Option<f64>,
    #[serde(default)]
    pub fixed_allowances: Vec<FixedAllowance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FixedAllowance {
    pub name: String,
    /// Annual amount.
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitKind {
    /// Fixed annual amount.
    Fixed,
    /// Fraction of annual basic.
    Percentage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BenefitPolicy {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BenefitKind,
    pub value: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub font_family: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentTerms {
    pub probation_months: Option<u32>,
    pub notice_period_days: Option<u32>,
    pub working_hours: Option<String>,
    pub leave_policy: Option<String>,
    #[serde(default)]
    pub additional_terms: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceInfo {
    #[serde(default)]
    pub standards: Vec<String>,
    pub statement: Option<String>,
}

/// Frozen copy of the company fields an offer depends on.
///
/// Stored on the offer so later company edits never change an issued offer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanySnapshot {
    pub company_id: Option<Uuid>,
    pub name: Option<String>,
    pub company_type: CompanyType,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub currency: String,
    pub salary_structure: SalaryStructure,
    pub benefits: Vec<BenefitPolicy>,
    pub branding: Branding,
    pub address: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub offer_validity_days: Option<i64>,
}

impl CompanySnapshot {
    pub fn capture(policy: &CompanyPolicy) -> Self {
        let company_type = policy.resolved_company_type();
        Self {
            company_id: policy.company_id,
            name: policy.name.clone(),
            company_type,
            industry: policy.industry.clone(),
            location: policy.location.clone(),
            currency: policy.currency_code().to_string(),
            salary_structure: company_type
                .default_structure()
                .merged_with(&policy.salary_structure),
            benefits: policy.benefits.clone(),
            branding: policy.branding.clone(),
            address: policy.address.clone(),
            website: policy.website.clone(),
            offer_validity_days: policy.offer_validity_days,
        }
    }
}

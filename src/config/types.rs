//! Configuration types for country rule sets.
//!
//! This module contains two layers of types: the loosely-shaped structures that
//! are deserialized from a country's YAML file, and the validated, immutable
//! [`CountryConfig`] that the calculators consume. Conversion between the two
//! happens once, at load time, via [`TryFrom`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::error::{EngineError, EngineResult};

fn default_periods_per_year() -> u32 {
    12
}

fn default_overtime_multiplier() -> Decimal {
    Decimal::new(125, 2)
}

/// A single income tax bracket as written in the rule file.
#[derive(Debug, Clone, Deserialize)]
pub struct BracketEntry {
    /// Upper bound of the bracket; `null` marks the unbounded top bracket.
    #[serde(default)]
    pub up_to: Option<Decimal>,
    /// Marginal rate applied to income inside this bracket.
    pub rate: Decimal,
}

/// A statutory rule as written in the rule file.
///
/// Used for employee contributions, other employee deductions and employer
/// contributions alike; fields that do not apply to a list are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleEntry {
    /// Name of the rule, used as the breakdown key.
    #[serde(default)]
    pub name: Option<String>,
    /// Percentage rate (e.g. `0.0635`).
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// Flat amount.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// `gross`, `per_period`, `amount` or `annual`.
    #[serde(default)]
    pub basis: Option<String>,
    /// Whether the deduction reduces taxable income.
    #[serde(default)]
    pub pre_tax: bool,
    /// Whether the deduction requires an employee opt-in.
    #[serde(default)]
    pub optional: bool,
    /// Per-period ceiling.
    #[serde(default)]
    pub max_amount: Option<Decimal>,
    /// Ceiling on the annualized amount.
    #[serde(default)]
    pub annual_cap: Option<Decimal>,
    /// Label override for employer cost breakdowns.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// An optional benefit as written in the rule file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BenefitEntry {
    /// Employee percentage rate.
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// Employee flat amount.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Basis for the employee share.
    #[serde(default)]
    pub basis: Option<String>,
    /// Whether the employee share is deducted before tax.
    #[serde(default)]
    pub pre_tax: bool,
    /// Employer match percentage rate.
    #[serde(default)]
    pub employer_rate: Option<Decimal>,
    /// Employer match flat amount.
    #[serde(default)]
    pub employer_amount: Option<Decimal>,
    /// Basis for the employer match.
    #[serde(default)]
    pub employer_basis: Option<String>,
    /// Per-period ceiling for the employer match.
    #[serde(default)]
    pub employer_max_amount: Option<Decimal>,
    /// Annual ceiling for the employer match.
    #[serde(default)]
    pub employer_annual_cap: Option<Decimal>,
    /// Label override for the employer match.
    #[serde(default)]
    pub employer_display_name: Option<String>,
}

/// The `statutory` section of a rule file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatutorySection {
    /// Mandatory employee contributions.
    #[serde(default)]
    pub employee_contributions: Vec<RuleEntry>,
    /// Additional employee deductions, possibly opt-in.
    #[serde(default)]
    pub other_employee_deductions: Vec<RuleEntry>,
    /// Employer-side contributions.
    #[serde(default)]
    pub employer_contributions: Vec<RuleEntry>,
}

/// A complete country rule file.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryConfigFile {
    /// The country key used to resolve this rule set.
    pub country: String,
    /// Number of pay periods per year.
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
    /// Multiplier applied to the hourly rate for overtime hours.
    #[serde(default = "default_overtime_multiplier")]
    pub overtime_multiplier: Decimal,
    /// Progressive income tax brackets, in any order.
    #[serde(default)]
    pub income_tax_brackets: Vec<BracketEntry>,
    /// Tax treatment of named allowances.
    #[serde(default)]
    pub allowance_rules: BTreeMap<String, AllowanceRule>,
    /// Statutory contribution lists.
    #[serde(default)]
    pub statutory: StatutorySection,
    /// Catalog of opt-in benefits.
    #[serde(default)]
    pub optional_benefits: BTreeMap<String, BenefitEntry>,
}

/// Whether an allowance counts towards taxable income.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxTreatment {
    /// The allowance is excluded from taxable income.
    Exempt,
    /// The allowance is taxed like ordinary earnings.
    #[default]
    #[serde(other)]
    Taxable,
}

/// Rule for a named allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AllowanceRule {
    /// How the allowance is treated for income tax; taxable when absent.
    #[serde(default)]
    pub tax_treatment: TaxTreatment,
}

/// Whether a rate or amount applies per period or to an annualized value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    /// Applies to the per-period gross (or is a per-period flat amount).
    #[default]
    Gross,
    /// Applies to the annualized value and is prorated back to the period.
    Annual,
}

impl Basis {
    /// Parses a basis string from a rule file.
    ///
    /// Returns `None` for values the engine does not understand.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::config::Basis;
    ///
    /// assert_eq!(Basis::parse("per_period"), Some(Basis::Gross));
    /// assert_eq!(Basis::parse("annual"), Some(Basis::Annual));
    /// assert_eq!(Basis::parse("weekly"), None);
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gross" | "per_period" | "amount" => Some(Basis::Gross),
            "annual" => Some(Basis::Annual),
            _ => None,
        }
    }
}

/// The closed shape of every contribution rule: a percentage or a flat amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAmount {
    /// A rate applied to gross pay.
    Percentage {
        /// The rate, e.g. `0.05` for 5%.
        rate: Decimal,
        /// Whether the rate applies to period or annualized gross.
        basis: Basis,
    },
    /// A flat amount.
    Fixed {
        /// The amount.
        amount: Decimal,
        /// Whether the amount is per period or annual.
        basis: Basis,
    },
}

/// Ceilings applied after the base amount of a rule is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Caps {
    /// Per-period ceiling.
    pub max_amount: Option<Decimal>,
    /// Ceiling on the annualized amount.
    pub annual_cap: Option<Decimal>,
}

/// A resolved contribution rule shared by employee and employer calculations.
///
/// A rule whose `amount` is `None` was missing both `rate` and `amount` (or had
/// an unknown basis) and contributes zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionRule {
    /// Rule name.
    pub name: String,
    /// How the base amount is derived.
    pub amount: Option<RuleAmount>,
    /// Ceilings applied to the base amount.
    pub caps: Caps,
}

/// A statutory (or other) employee-side deduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeDeduction {
    /// The contribution rule.
    pub rule: ContributionRule,
    /// Whether the deduction reduces taxable income.
    pub pre_tax: bool,
    /// Whether the deduction applies only to employees who opted in.
    pub optional: bool,
}

/// An employer-side contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployerContribution {
    /// Breakdown label.
    pub label: String,
    /// The contribution rule.
    pub rule: ContributionRule,
}

/// An opt-in benefit from the country catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalBenefit {
    /// Benefit name, matched against the employee's opt-ins.
    pub name: String,
    /// Default employee share.
    pub amount: Option<RuleAmount>,
    /// Basis used for the default share and for employee overrides.
    pub basis: Basis,
    /// Default pre-tax classification.
    pub pre_tax: bool,
    /// Employer match, if the benefit has one.
    pub employer: Option<EmployerContribution>,
}

/// A progressive income tax bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Upper bound of the bracket; `None` is unbounded.
    pub up_to: Option<Decimal>,
    /// Marginal rate for income inside this bracket.
    pub rate: Decimal,
}

/// The validated rule set for one country.
///
/// Immutable after construction; share it behind an `Arc` or a reference across
/// any number of concurrent calculations.
#[derive(Debug, Clone)]
pub struct CountryConfig {
    country: String,
    periods_per_year: u32,
    overtime_multiplier: Decimal,
    /// Sorted ascending by `up_to`, unbounded brackets last.
    income_tax_brackets: Vec<TaxBracket>,
    allowance_rules: BTreeMap<String, AllowanceRule>,
    employee_contributions: Vec<EmployeeDeduction>,
    other_employee_deductions: Vec<EmployeeDeduction>,
    employer_contributions: Vec<EmployerContribution>,
    optional_benefits: BTreeMap<String, OptionalBenefit>,
}

impl CountryConfig {
    /// Parses and validates a rule set from a YAML string.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::config::CountryConfig;
    ///
    /// let config = CountryConfig::from_yaml_str(
    ///     "country: Testland\nincome_tax_brackets:\n  - { up_to: null, rate: 0.2 }\n",
    /// )?;
    /// assert_eq!(config.country(), "Testland");
    /// assert_eq!(config.periods_per_year(), 12);
    /// # Ok::<(), payroll_engine::error::EngineError>(())
    /// ```
    pub fn from_yaml_str(content: &str) -> EngineResult<Self> {
        let file: CountryConfigFile =
            serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
                path: "<inline>".to_string(),
                message: e.to_string(),
            })?;
        Self::try_from(file)
    }

    /// Returns the country key.
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Returns the number of pay periods per year (always at least 1).
    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    /// Returns the overtime multiplier.
    pub fn overtime_multiplier(&self) -> Decimal {
        self.overtime_multiplier
    }

    /// Returns the tax brackets, sorted ascending with unbounded brackets last.
    pub fn income_tax_brackets(&self) -> &[TaxBracket] {
        &self.income_tax_brackets
    }

    /// Returns the allowance rules.
    pub fn allowance_rules(&self) -> &BTreeMap<String, AllowanceRule> {
        &self.allowance_rules
    }

    /// Returns the mandatory employee contributions.
    pub fn employee_contributions(&self) -> &[EmployeeDeduction] {
        &self.employee_contributions
    }

    /// Returns the other employee deductions.
    pub fn other_employee_deductions(&self) -> &[EmployeeDeduction] {
        &self.other_employee_deductions
    }

    /// Returns the employer contributions.
    pub fn employer_contributions(&self) -> &[EmployerContribution] {
        &self.employer_contributions
    }

    /// Returns the optional benefit catalog.
    pub fn optional_benefits(&self) -> &BTreeMap<String, OptionalBenefit> {
        &self.optional_benefits
    }
}

impl TryFrom<CountryConfigFile> for CountryConfig {
    type Error = EngineError;

    fn try_from(file: CountryConfigFile) -> EngineResult<Self> {
        let country = file.country.trim().to_string();
        if country.is_empty() {
            return Err(EngineError::InvalidConfig {
                country: file.country,
                message: "country key must not be empty".to_string(),
            });
        }
        if file.periods_per_year == 0 {
            return Err(EngineError::InvalidConfig {
                country,
                message: "periods_per_year must be at least 1".to_string(),
            });
        }

        let mut income_tax_brackets: Vec<TaxBracket> = file
            .income_tax_brackets
            .into_iter()
            .map(|b| TaxBracket {
                up_to: b.up_to,
                rate: b.rate,
            })
            .collect();
        income_tax_brackets.sort_by(|a, b| match (a.up_to, b.up_to) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        let employee_contributions =
            convert_employee_rules(&country, file.statutory.employee_contributions);
        let other_employee_deductions =
            convert_employee_rules(&country, file.statutory.other_employee_deductions);

        let employer_contributions = file
            .statutory
            .employer_contributions
            .into_iter()
            .map(|entry| {
                let name = entry
                    .name
                    .clone()
                    .unwrap_or_else(|| "Employer Contribution".to_string());
                let label = entry.display_name.clone().unwrap_or_else(|| name.clone());
                EmployerContribution {
                    label,
                    rule: ContributionRule {
                        amount: rule_amount(
                            &country,
                            &name,
                            entry.rate,
                            entry.amount,
                            entry.basis.as_deref(),
                        ),
                        caps: Caps {
                            max_amount: entry.max_amount,
                            annual_cap: entry.annual_cap,
                        },
                        name,
                    },
                }
            })
            .collect();

        let mut optional_benefits = BTreeMap::new();
        for (name, entry) in file.optional_benefits {
            let basis = parse_basis_or_default(&country, &name, entry.basis.as_deref());
            let amount = match basis {
                Some(basis) => resolve_shape(&country, &name, entry.rate, entry.amount, basis),
                None => None,
            };

            let employer = if entry.employer_rate.is_some() || entry.employer_amount.is_some() {
                let employer_name = format!("Employer {}", name);
                Some(EmployerContribution {
                    label: entry
                        .employer_display_name
                        .clone()
                        .unwrap_or_else(|| employer_name.clone()),
                    rule: ContributionRule {
                        amount: rule_amount(
                            &country,
                            &employer_name,
                            entry.employer_rate,
                            entry.employer_amount,
                            entry.employer_basis.as_deref(),
                        ),
                        caps: Caps {
                            max_amount: entry.employer_max_amount,
                            annual_cap: entry.employer_annual_cap,
                        },
                        name: employer_name,
                    },
                })
            } else {
                None
            };

            optional_benefits.insert(
                name.clone(),
                OptionalBenefit {
                    name,
                    amount,
                    basis: basis.unwrap_or_default(),
                    pre_tax: entry.pre_tax,
                    employer,
                },
            );
        }

        Ok(Self {
            country,
            periods_per_year: file.periods_per_year,
            overtime_multiplier: file.overtime_multiplier,
            income_tax_brackets,
            allowance_rules: file.allowance_rules,
            employee_contributions,
            other_employee_deductions,
            employer_contributions,
            optional_benefits,
        })
    }
}

/// Converts employee-side rule entries, dropping rules without a name.
fn convert_employee_rules(country: &str, entries: Vec<RuleEntry>) -> Vec<EmployeeDeduction> {
    let mut seen = BTreeSet::new();
    let mut rules = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(name) = entry.name else {
            warn!(country = %country, "Dropping employee deduction without a name");
            continue;
        };
        if !seen.insert(name.clone()) {
            warn!(
                country = %country,
                rule = %name,
                "Duplicate employee deduction name; amounts will be combined"
            );
        }

        rules.push(EmployeeDeduction {
            rule: ContributionRule {
                amount: rule_amount(
                    country,
                    &name,
                    entry.rate,
                    entry.amount,
                    entry.basis.as_deref(),
                ),
                caps: Caps {
                    max_amount: entry.max_amount,
                    annual_cap: entry.annual_cap,
                },
                name,
            },
            pre_tax: entry.pre_tax,
            optional: entry.optional,
        });
    }

    rules
}

fn parse_basis_or_default(country: &str, rule: &str, basis: Option<&str>) -> Option<Basis> {
    match basis {
        None => Some(Basis::Gross),
        Some(raw) => {
            let parsed = Basis::parse(raw);
            if parsed.is_none() {
                warn!(
                    country = %country,
                    rule = %rule,
                    basis = %raw,
                    "Unknown basis; rule contributes zero"
                );
            }
            parsed
        }
    }
}

fn rule_amount(
    country: &str,
    rule: &str,
    rate: Option<Decimal>,
    amount: Option<Decimal>,
    basis: Option<&str>,
) -> Option<RuleAmount> {
    let basis = parse_basis_or_default(country, rule, basis)?;
    let resolved = resolve_shape(country, rule, rate, amount, basis);
    if resolved.is_none() {
        warn!(
            country = %country,
            rule = %rule,
            "Rule has neither rate nor amount; contributes zero"
        );
    }
    resolved
}

fn resolve_shape(
    country: &str,
    rule: &str,
    rate: Option<Decimal>,
    amount: Option<Decimal>,
    basis: Basis,
) -> Option<RuleAmount> {
    match (rate, amount) {
        (Some(_), Some(amount)) => {
            warn!(
                country = %country,
                rule = %rule,
                "Rule carries both rate and amount; using amount"
            );
            Some(RuleAmount::Fixed { amount, basis })
        }
        (None, Some(amount)) => Some(RuleAmount::Fixed { amount, basis }),
        (Some(rate), None) => Some(RuleAmount::Percentage { rate, basis }),
        (None, None) => None,
    }
}

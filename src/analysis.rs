//! Analysis orchestration.
//!
//! [`analyze`] runs the whole tabulation over one merged
//! individual/household dataset:
//!
//! 1. check that computer use and internet use are present (the only fatal
//!    precondition);
//! 2. resolve the optional fields (age, sex, education, income, weight);
//! 3. label the categorical survey fields;
//! 4. derive the exclusion indicators;
//! 5. band age and income;
//! 6. build the distribution and breakdown tables and the summary.
//!
//! A missing optional field only removes the tables that depend on it.

use log::{debug, info};
use serde::Serialize;

use crate::{
    aggregate::{self, CategoryCount, round2},
    bucket::{self, AgeBuckets},
    config::SurveyConfig,
    data::Value,
    dataset::Dataset,
    error::AnalysisError,
    field::{CategoricalField, NumericField},
    indicators::{ExclusionIndicators, ExclusionLevel},
    labels::LabelMapper,
    resolver::SemanticField,
    table::{AggregateTable, RATE_HEADER, TableSet},
};

pub const EXCLUDED_COLUMN: &str = "excluded";
pub const EXCLUSION_LEVEL_COLUMN: &str = "exclusion_level";

pub mod titles {
    pub const COMPUTER_USE: &str = "Computer use";
    pub const MOBILE_USE: &str = "Mobile use";
    pub const INTERNET_USE: &str = "Internet use";
    pub const HOUSEHOLD_COMPUTER: &str = "Household computer";
    pub const HOUSEHOLD_INTERNET: &str = "Household internet access";
    pub const EXCLUSION_LEVEL: &str = "Exclusion - ordinal level";
    pub const GAP_BY_AGE: &str = "Exclusion gap by age";
    pub const GAP_BY_SEX: &str = "Exclusion gap by sex";
    pub const GAP_BY_EDUCATION: &str = "Exclusion gap by education";
    pub const INTERNET_BY_QUINTILE: &str = "Internet access by income quintile";
}

const EXCLUSION_LEVEL_HEADER: &str = "Exclusion level";
const AGE_HEADER: &str = "Age";
const ROW_BUCKET_HEADER: &str = "Row bucket";
const SEX_HEADER: &str = "Sex";
const EDUCATION_HEADER: &str = "Education level";
const QUINTILE_HEADER: &str = "Income quintile";
const QUINTILE_VALUE_HEADER: &str = "% households with internet";

/// Column each optional field resolved to, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedFields {
    pub age: Option<String>,
    pub sex: Option<String>,
    pub education: Option<String>,
    pub income: Option<String>,
    pub weight: Option<String>,
}

impl ResolvedFields {
    pub fn resolve(headers: &[String], config: &SurveyConfig) -> Self {
        let find = |field| config.aliases.resolve(headers, field).map(str::to_string);
        Self {
            age: find(SemanticField::Age),
            sex: find(SemanticField::Sex),
            education: find(SemanticField::Education),
            income: find(SemanticField::Income),
            weight: find(SemanticField::Weight),
        }
    }

    pub fn get(&self, field: SemanticField) -> Option<&str> {
        match field {
            SemanticField::Age => self.age.as_deref(),
            SemanticField::Sex => self.sex.as_deref(),
            SemanticField::Education => self.education.as_deref(),
            SemanticField::Income => self.income.as_deref(),
            SemanticField::Weight => self.weight.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupExtreme {
    pub group: String,
    pub percent: f64,
}

/// Highest- and lowest-rate groups of one breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapSummary {
    pub highest: GroupExtreme,
    pub lowest: GroupExtreme,
    /// Difference between the two rates, in percentage points.
    pub gap_pp: f64,
}

impl GapSummary {
    pub fn from_table(table: &AggregateTable) -> Option<Self> {
        let highest = table.highest()?;
        let lowest = table.lowest()?;
        Some(Self {
            highest: GroupExtreme {
                group: highest.group.clone(),
                percent: highest.percent,
            },
            lowest: GroupExtreme {
                group: lowest.group.clone(),
                percent: lowest.percent,
            },
            gap_pp: round2(highest.percent - lowest.percent),
        })
    }
}

/// Scalar statistics feeding the narrative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub respondents: usize,
    pub weighted: bool,
    pub exclusion_total_pct: f64,
    pub household_internet_pct: Option<f64>,
    pub household_computer_pct: Option<f64>,
    pub age_bands_semantic: bool,
    pub age: Option<GapSummary>,
    pub sex: Option<GapSummary>,
    pub education: Option<GapSummary>,
    pub income_quintile: Option<GapSummary>,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub tables: TableSet,
    /// Input dataset with labelled survey fields and the indicator columns.
    pub dataset: Dataset,
    pub summary: Summary,
    pub resolved: ResolvedFields,
}

pub fn analyze(dataset: &Dataset, config: &SurveyConfig) -> Result<Analysis, AnalysisError> {
    let missing = config
        .required_fields()
        .iter()
        .filter(|name| !dataset.has_column(name))
        .map(|name| name.to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(AnalysisError::MissingCoreFields { fields: missing });
    }

    let resolved = ResolvedFields::resolve(dataset.headers(), config);
    for field in SemanticField::ALL {
        match resolved.get(field) {
            Some(column) => debug!("Resolved {field} to column '{column}'"),
            None => info!(
                "No {field} column found (tried {}); dependent tables are skipped",
                config.aliases.for_field(field).join(", ")
            ),
        }
    }

    let mut mapper = LabelMapper::new(&config.labels);
    if let Some(column) = &resolved.sex {
        mapper.bind(column, &config.labels.sex);
    }
    if let Some(column) = &resolved.education {
        mapper.bind(column, &config.labels.education);
    }

    let weights = resolved
        .weight
        .as_deref()
        .and_then(|column| match NumericField::from_dataset(dataset, column) {
            Some(field) => Some(field.values),
            None => {
                info!("Weight column '{column}' is not numeric; computing unweighted");
                None
            }
        });
    let weights = weights.as_deref();

    let core = &config.core;
    let categorical = |name: &str| CategoricalField::from_dataset(dataset, name, &mapper);
    let surveyed = [
        (titles::COMPUTER_USE, core.computer_use.as_str()),
        (titles::MOBILE_USE, core.mobile_use.as_str()),
        (titles::INTERNET_USE, core.internet_use.as_str()),
        (titles::HOUSEHOLD_COMPUTER, core.household_computer.as_str()),
        (titles::HOUSEHOLD_INTERNET, core.household_internet.as_str()),
    ]
    .into_iter()
    .filter_map(|(title, name)| categorical(name).map(|field| (title, field)))
    .collect::<Vec<_>>();
    let field_for = |name: &str| surveyed.iter().find(|(_, f)| f.name == name).map(|(_, f)| f);

    let (Some(computer), Some(internet)) =
        (field_for(core.computer_use.as_str()), field_for(core.internet_use.as_str()))
    else {
        return Err(AnalysisError::MissingCoreFields {
            fields: config.required_fields().iter().map(|s| s.to_string()).collect(),
        });
    };
    let indicators = ExclusionIndicators::derive(computer, internet, config.labels.no_label());
    let excluded = indicators.excluded();

    let age = resolved
        .age
        .as_deref()
        .and_then(|column| NumericField::from_dataset(dataset, column));
    let age_buckets = bucket::bucket_ages(age.as_ref(), dataset.len());
    let quintiles = resolved
        .income
        .as_deref()
        .and_then(|column| NumericField::from_dataset(dataset, column))
        .and_then(|income| bucket::income_quintiles(&income));
    let sex = resolved.sex.as_deref().and_then(|c| categorical(c));
    let education = resolved.education.as_deref().and_then(|c| categorical(c));
    let household_internet = field_for(core.household_internet.as_str());
    let household_computer = field_for(core.household_computer.as_str());
    let yes_label = config.labels.yes_label();

    let mut tables = TableSet::default();
    for (title, field) in &surveyed {
        let counts = aggregate::value_counts(&field.values, weights);
        tables.insert(AggregateTable::distribution(*title, field.name.clone(), &counts));
    }
    tables.insert(exclusion_level_table(&indicators, weights));
    tables.insert(age_table(&age_buckets, &excluded, weights));
    if let Some(sex) = &sex {
        let rates = aggregate::proportions_by_group(&sex.values, &excluded, weights);
        tables.insert(AggregateTable::breakdown(
            titles::GAP_BY_SEX,
            SEX_HEADER,
            RATE_HEADER,
            &rates,
        ));
    }
    if let Some(education) = &education {
        let rates = aggregate::proportions_by_group(&education.values, &excluded, weights);
        tables.insert(AggregateTable::breakdown(
            titles::GAP_BY_EDUCATION,
            EDUCATION_HEADER,
            RATE_HEADER,
            &rates,
        ));
    }
    match (household_internet, &quintiles) {
        (Some(access), Some(quintiles)) => {
            let rates =
                aggregate::proportions_by_group(quintiles, &access.flag_eq(yes_label), weights);
            tables.insert(AggregateTable::breakdown(
                titles::INTERNET_BY_QUINTILE,
                QUINTILE_HEADER,
                QUINTILE_VALUE_HEADER,
                &rates,
            ));
        }
        (Some(_), None) if resolved.income.is_some() => {
            info!("Income quintiles could not be computed; skipping the quintile breakdown");
        }
        _ => {}
    }

    let rate = |field: Option<&CategoricalField>| {
        field.map(|f| round2(aggregate::weighted_proportion(&f.flag_eq(yes_label), weights) * 100.0))
    };
    let gap = |title: &str| tables.get(title).and_then(GapSummary::from_table);
    let summary = Summary {
        respondents: dataset.len(),
        weighted: weights.is_some(),
        exclusion_total_pct: round2(aggregate::weighted_proportion(&excluded, weights) * 100.0),
        household_internet_pct: rate(household_internet),
        household_computer_pct: rate(household_computer),
        age_bands_semantic: age_buckets.is_semantic(),
        age: gap(titles::GAP_BY_AGE),
        sex: gap(titles::GAP_BY_SEX),
        education: gap(titles::GAP_BY_EDUCATION),
        income_quintile: gap(titles::INTERNET_BY_QUINTILE),
    };

    let mut enriched = dataset.clone();
    for field in surveyed
        .iter()
        .map(|(_, f)| f)
        .chain(sex.iter())
        .chain(education.iter())
    {
        enriched.set_column(&field.name, field.to_values())?;
    }
    enriched.set_column(EXCLUDED_COLUMN, indicators.binary_column())?;
    enriched.set_column(EXCLUSION_LEVEL_COLUMN, indicators.ordinal_column())?;

    info!(
        "Built {} table(s) for {} respondent(s); total exclusion {:.2}%",
        tables.len(),
        summary.respondents,
        summary.exclusion_total_pct
    );
    Ok(Analysis {
        tables,
        dataset: enriched,
        summary,
        resolved,
    })
}

fn exclusion_level_table(
    indicators: &ExclusionIndicators,
    weights: Option<&[Option<f64>]>,
) -> AggregateTable {
    let counts = aggregate::value_counts(&indicators.ordinal_categories(), weights)
        .into_iter()
        .map(|count| CategoryCount {
            category: count
                .category
                .as_deref()
                .and_then(|code| code.parse::<i64>().ok())
                .and_then(ExclusionLevel::from_code)
                .map(|level| level.label().to_string())
                .or(count.category),
            count: count.count,
        })
        .collect::<Vec<_>>();
    AggregateTable::distribution(titles::EXCLUSION_LEVEL, EXCLUSION_LEVEL_HEADER, &counts)
}

fn age_table(
    buckets: &AgeBuckets,
    excluded: &[bool],
    weights: Option<&[Option<f64>]>,
) -> AggregateTable {
    let rates = aggregate::proportions_by_group(&buckets.bands, excluded, weights);
    let header = if buckets.is_semantic() {
        AGE_HEADER
    } else {
        ROW_BUCKET_HEADER
    };
    AggregateTable::breakdown(titles::GAP_BY_AGE, header, RATE_HEADER, &rates)
        .mark_degraded(!buckets.is_semantic())
}

/// Convenience for callers holding raw CSV cells: the ordinal level stored
/// in an enriched dataset row.
pub fn exclusion_level_of(value: &Value) -> Option<ExclusionLevel> {
    value.as_code().and_then(ExclusionLevel::from_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yes_no(code: i64) -> Option<Value> {
        Some(Value::Integer(code))
    }

    fn small_dataset() -> Dataset {
        Dataset::from_columns([
            ("IP_III_04", vec![yes_no(2), yes_no(2), yes_no(1), yes_no(1)]),
            ("IP_III_06", vec![yes_no(2), yes_no(1), yes_no(1), yes_no(1)]),
            (
                "CH04",
                vec![yes_no(1), yes_no(2), yes_no(2), yes_no(1)],
            ),
            (
                "CH06",
                vec![
                    Some(Value::Integer(70)),
                    Some(Value::Integer(17)),
                    Some(Value::Integer(18)),
                    Some(Value::Integer(40)),
                ],
            ),
        ])
        .expect("dataset")
    }

    #[test]
    fn missing_core_fields_are_fatal_and_named() {
        let dataset = Dataset::from_columns([("CH06", vec![Some(Value::Integer(3))])]).unwrap();
        let err = analyze(&dataset, &SurveyConfig::default()).unwrap_err();
        match err {
            AnalysisError::MissingCoreFields { fields } => {
                assert_eq!(fields, vec!["IP_III_04", "IP_III_06"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn builds_tables_for_available_fields_only() {
        let analysis = analyze(&small_dataset(), &SurveyConfig::default()).unwrap();
        assert_eq!(
            analysis.tables.titles(),
            vec![
                titles::COMPUTER_USE,
                titles::INTERNET_USE,
                titles::EXCLUSION_LEVEL,
                titles::GAP_BY_AGE,
                titles::GAP_BY_SEX,
            ]
        );
        assert_eq!(analysis.summary.exclusion_total_pct, 25.0);
        assert!(analysis.summary.household_internet_pct.is_none());
        assert!(analysis.summary.income_quintile.is_none());
    }

    #[test]
    fn sex_breakdown_uses_labels_and_reports_gap() {
        let analysis = analyze(&small_dataset(), &SurveyConfig::default()).unwrap();
        let table = analysis.tables.get(titles::GAP_BY_SEX).unwrap();
        assert_eq!(table.row("Male").unwrap().percent, 50.0);
        assert_eq!(table.row("Female").unwrap().percent, 0.0);
        let gap = analysis.summary.sex.unwrap();
        assert_eq!(gap.highest.group, "Male");
        assert_eq!(gap.gap_pp, 50.0);
    }

    #[test]
    fn enriched_dataset_carries_labels_and_indicators() {
        let analysis = analyze(&small_dataset(), &SurveyConfig::default()).unwrap();
        let data = &analysis.dataset;
        assert_eq!(
            data.column("IP_III_04").unwrap()[0],
            Some(Value::Text("No".to_string()))
        );
        assert_eq!(data.column("CH04").unwrap()[1], Some(Value::Text("Female".to_string())));
        let levels = data
            .column(EXCLUSION_LEVEL_COLUMN)
            .unwrap()
            .iter()
            .map(|v| v.as_ref().and_then(exclusion_level_of))
            .collect::<Vec<_>>();
        assert_eq!(
            levels,
            vec![
                Some(ExclusionLevel::Total),
                Some(ExclusionLevel::Partial),
                Some(ExclusionLevel::None),
                Some(ExclusionLevel::None),
            ]
        );
        assert_eq!(
            data.column(EXCLUDED_COLUMN).unwrap(),
            &[yes_no(1), yes_no(0), yes_no(0), yes_no(0)]
        );
    }

    #[test]
    fn age_fallback_is_flagged_as_degraded() {
        let dataset = Dataset::from_columns([
            ("IP_III_04", vec![yes_no(2); 5]),
            ("IP_III_06", vec![yes_no(2); 5]),
        ])
        .unwrap();
        let analysis = analyze(&dataset, &SurveyConfig::default()).unwrap();
        let table = analysis.tables.get(titles::GAP_BY_AGE).unwrap();
        assert!(table.degraded);
        assert_eq!(table.group_header, "Row bucket");
        assert!(!analysis.summary.age_bands_semantic);
    }

    #[test]
    fn text_answers_are_labelled_before_derivation() {
        let text = |s: &str| Some(Value::Text(s.to_string()));
        let dataset = Dataset::from_columns([
            ("IP_III_04", vec![text("NO"), text("si"), yes_no(2)]),
            ("IP_III_06", vec![text("no"), text("No"), text("2")]),
        ])
        .unwrap();
        let analysis = analyze(&dataset, &SurveyConfig::default()).unwrap();
        let table = analysis.tables.get(titles::EXCLUSION_LEVEL).unwrap();
        assert_eq!(table.row("Total exclusion").unwrap().count, Some(2));
        assert_eq!(table.row("Partial exclusion").unwrap().count, Some(1));
    }

    #[test]
    fn non_numeric_weight_column_is_ignored() {
        let mut dataset = small_dataset();
        dataset
            .push_column("PONDERA", vec![Some(Value::Text("x".to_string())); 4])
            .unwrap();
        let analysis = analyze(&dataset, &SurveyConfig::default()).unwrap();
        assert!(!analysis.summary.weighted);
        assert_eq!(analysis.resolved.weight.as_deref(), Some("PONDERA"));
    }
}

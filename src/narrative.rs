//! Markdown report built from the tables and summary of one analysis.
//!
//! The output is fully determined by its inputs: the same tables and summary
//! always render the same document.

use std::fmt::Write as _;

use crate::{
    analysis::{GapSummary, Summary, titles},
    table::{AggregateTable, TableSet},
};

pub const DEFINITION_HEADING: &str = "1. Definition of digital exclusion";
pub const RESULTS_HEADING: &str = "2. Key results";
pub const CONCLUSIONS_HEADING: &str = "3. Conclusions";
pub const RECOMMENDATIONS_HEADING: &str = "4. Recommendations";

const DEFINITION: &str = "Digital exclusion shows both as a lack of access to infrastructure \
(devices and connectivity) and as non-use or restricted use of the technologies. This report \
approximates it through household access to internet and to a computer, individual use of \
internet and computers, and an ordinal exclusion indicator (none, partial, total).";

const FALLBACK_CONCLUSION: &str = "The evidence shows relevant gaps by age, household \
conditions and socioeconomic level.";

const RECOMMENDATIONS: &str = "Taken together, the findings suggest that digital exclusion \
compounds existing inequalities. Lower-income households face infrastructure limits that, \
combined with lower educational attainment and life-cycle effects, reduce the effective \
adoption of digital technologies. Reversing this pattern calls for expanding quality fixed \
connectivity in lagging areas, widening access to devices through financing or provision \
programmes, and digital literacy training tailored to age groups and educational paths \
with a focus on educational and work-related uses.";

/// Section heading used for a table in the key results.
pub fn friendly_name(title: &str) -> &str {
    match title {
        titles::COMPUTER_USE => "Computer use (individuals)",
        titles::MOBILE_USE => "Mobile phone use (individuals)",
        titles::INTERNET_USE => "Internet use (individuals)",
        titles::HOUSEHOLD_COMPUTER => "Computer availability (households)",
        titles::HOUSEHOLD_INTERNET => "Internet access (households)",
        titles::EXCLUSION_LEVEL => "Digital exclusion (ordinal index)",
        titles::GAP_BY_AGE => "Gap by age (excluded persons)",
        titles::GAP_BY_SEX => "Gap by sex (excluded persons)",
        titles::GAP_BY_EDUCATION => "Gap by education (excluded persons)",
        titles::INTERNET_BY_QUINTILE => "Internet access by household income quintile",
        other => other,
    }
}

pub fn render_report(tables: &TableSet, summary: &Summary, year: &str) -> String {
    let mut doc = String::new();
    let _ = writeln!(doc, "# Digital Inclusion Report {year}");
    let _ = writeln!(doc);
    let _ = writeln!(
        doc,
        "This report presents a diagnosis of digital inclusion and exclusion for {year}, \
combining household and individual survey records ({} respondents, {}).",
        summary.respondents,
        if summary.weighted {
            "weighted"
        } else {
            "unweighted"
        }
    );
    let _ = writeln!(doc);

    let _ = writeln!(doc, "## {DEFINITION_HEADING}");
    let _ = writeln!(doc);
    let _ = writeln!(doc, "{DEFINITION}");
    let _ = writeln!(doc);

    let _ = writeln!(doc, "## {RESULTS_HEADING}");
    for table in tables {
        let _ = writeln!(doc);
        write_table_section(&mut doc, table);
    }
    let _ = writeln!(doc);

    let _ = writeln!(doc, "## {CONCLUSIONS_HEADING}");
    let _ = writeln!(doc);
    let sentences = conclusions(summary);
    if sentences.is_empty() {
        let _ = writeln!(doc, "{FALLBACK_CONCLUSION}");
    } else {
        let _ = writeln!(doc, "{}", sentences.join(" "));
    }
    let _ = writeln!(doc);

    let _ = writeln!(doc, "## {RECOMMENDATIONS_HEADING}");
    let _ = writeln!(doc);
    let _ = writeln!(doc, "{RECOMMENDATIONS}");
    doc
}

fn write_table_section(doc: &mut String, table: &AggregateTable) {
    let _ = writeln!(doc, "### {}", friendly_name(&table.title));
    if table.degraded {
        let _ = writeln!(
            doc,
            "\n_No age column was available; groups are row-position buckets and carry no meaning._"
        );
    }
    let _ = writeln!(doc);
    let headers = table.headers();
    for row in table.render_rows() {
        let line = headers
            .iter()
            .zip(&row)
            .map(|(header, cell)| format!("{header}: {cell}"))
            .collect::<Vec<_>>()
            .join(" - ");
        let _ = writeln!(doc, "- {line}");
    }
}

/// Templated sentences for the statistics the summary actually carries.
pub fn conclusions(summary: &Summary) -> Vec<String> {
    let mut sentences = Vec::new();
    if summary.respondents > 0 {
        sentences.push(format!(
            "Total digital exclusion (no internet and no computer use) reaches {:.2}% of people.",
            summary.exclusion_total_pct
        ));
    }
    if let (Some(internet), Some(computer)) =
        (summary.household_internet_pct, summary.household_computer_pct)
    {
        sentences.push(format!(
            "On the infrastructure side, {internet:.2}% of households have internet access \
and {computer:.2}% have a computer."
        ));
    }
    if summary.age_bands_semantic
        && let Some(age) = &summary.age
    {
        sentences.push(format!(
            "By age, the group with the highest exclusion is {} ({:.2}%).",
            age.highest.group, age.highest.percent
        ));
    }
    if let Some(sex) = &summary.sex {
        sentences.push(format!(
            "There is a gap by sex of {:.2} percentage points in the exclusion rate.",
            sex.gap_pp
        ));
    }
    if let Some(education) = &summary.education {
        sentences.push(gap_sentence("educational level", education));
    }
    if let Some(quintile) = &summary.income_quintile {
        sentences.push(format!(
            "Income inequality is marked: household internet access differs by {:.2} points \
between {} ({:.2}%) and {} ({:.2}%).",
            quintile.gap_pp,
            quintile.highest.group,
            quintile.highest.percent,
            quintile.lowest.group,
            quintile.lowest.percent
        ));
    }
    sentences
}

fn gap_sentence(dimension: &str, gap: &GapSummary) -> String {
    format!(
        "By {dimension}, exclusion ranges from {:.2}% ({}) to {:.2}% ({}), a gap of {:.2} points.",
        gap.lowest.percent, gap.lowest.group, gap.highest.percent, gap.highest.group, gap.gap_pp
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::GroupRate;
    use crate::analysis::GroupExtreme;
    use crate::table::RATE_HEADER;

    fn empty_summary() -> Summary {
        Summary {
            respondents: 0,
            weighted: false,
            exclusion_total_pct: 0.0,
            household_internet_pct: None,
            household_computer_pct: None,
            age_bands_semantic: false,
            age: None,
            sex: None,
            education: None,
            income_quintile: None,
        }
    }

    fn gap(high: (&str, f64), low: (&str, f64)) -> GapSummary {
        GapSummary {
            highest: GroupExtreme {
                group: high.0.to_string(),
                percent: high.1,
            },
            lowest: GroupExtreme {
                group: low.0.to_string(),
                percent: low.1,
            },
            gap_pp: high.1 - low.1,
        }
    }

    #[test]
    fn report_has_fixed_sections_in_order() {
        let report = render_report(&TableSet::default(), &empty_summary(), "2024");
        assert!(report.starts_with("# Digital Inclusion Report 2024\n"));
        let positions = [
            DEFINITION_HEADING,
            RESULTS_HEADING,
            CONCLUSIONS_HEADING,
            RECOMMENDATIONS_HEADING,
        ]
        .iter()
        .map(|h| report.find(&format!("## {h}")).expect(h))
        .collect::<Vec<_>>();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(report.contains(FALLBACK_CONCLUSION));
    }

    #[test]
    fn tables_render_as_bullets_under_friendly_names() {
        let mut tables = TableSet::default();
        let rates = vec![
            GroupRate {
                group: "Female".to_string(),
                percent: 20.0,
            },
            GroupRate {
                group: "Male".to_string(),
                percent: 10.0,
            },
        ];
        tables.insert(AggregateTable::breakdown(titles::GAP_BY_SEX, "Sex", RATE_HEADER, &rates));
        let report = render_report(&tables, &empty_summary(), "2023");
        assert!(report.contains("### Gap by sex (excluded persons)\n\n- Sex: Female - Percent: 20.00\n- Sex: Male - Percent: 10.00\n"));
    }

    #[test]
    fn conclusions_follow_available_statistics() {
        let mut summary = empty_summary();
        summary.respondents = 100;
        summary.exclusion_total_pct = 30.0;
        summary.household_internet_pct = Some(80.0);
        summary.household_computer_pct = Some(60.5);
        summary.sex = Some(gap(("Female", 35.0), ("Male", 25.0)));
        summary.age = Some(gap(("Row bucket 1", 40.0), ("Row bucket 2", 20.0)));

        let sentences = conclusions(&summary);
        assert_eq!(sentences.len(), 3);
        assert!(sentences[0].contains("30.00%"));
        assert!(sentences[1].contains("80.00% of households"));
        assert!(sentences[2].contains("10.00 percentage points"));

        summary.age_bands_semantic = true;
        summary.age = Some(gap(("65+", 55.0), ("18-29", 5.0)));
        let sentences = conclusions(&summary);
        assert!(sentences.iter().any(|s| s.contains("65+ (55.00%)")));
    }

    #[test]
    fn degraded_tables_are_flagged_in_the_report() {
        let mut tables = TableSet::default();
        let rates = vec![GroupRate {
            group: "Row bucket 1".to_string(),
            percent: 5.0,
        }];
        tables.insert(
            AggregateTable::breakdown(titles::GAP_BY_AGE, "Row bucket", RATE_HEADER, &rates)
                .mark_degraded(true),
        );
        let report = render_report(&tables, &empty_summary(), "2024");
        assert!(report.contains("row-position buckets"));
    }
}

//! Defect code generation.
//!
//! A defect code is the concatenation `product + process + part + defect`,
//! for example `C03` + `B` + `501` + `2` = `C03B5012`. Segments come from the
//! model's code tables; lookups that miss fall back to sentinel segments
//! instead of failing, so generation is a pure, infallible function of its
//! inputs and a [`CodeBook`] snapshot.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CodeTable, DefectTypes, OptionTables};

/// Process segment used when the process name is not in the table.
pub const UNKNOWN_PROCESS: &str = "B";
/// Part segment used when no part entry matches.
pub const UNKNOWN_PART: &str = "999";
/// Defect segment used when the category or defect name is unknown.
pub const UNKNOWN_DEFECT: &str = "9";

/// Immutable snapshot of one model's code tables and defect-type map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeBook {
    /// Processes, parts, defect causes and workers.
    pub tables: OptionTables,
    /// Defect digits keyed by part major category.
    pub defect_types: DefectTypes,
}

impl CodeBook {
    /// Bundle tables and a defect-type map.
    #[must_use]
    pub const fn new(tables: OptionTables, defect_types: DefectTypes) -> Self {
        Self {
            tables,
            defect_types,
        }
    }

    /// Process segment for a process name.
    #[must_use]
    pub fn process_segment(&self, process_name: &str) -> &str {
        self.tables
            .processes
            .code_for(process_name)
            .unwrap_or(UNKNOWN_PROCESS)
    }

    /// Part segment: exact name first, then bidirectional containment.
    #[must_use]
    pub fn part_segment(&self, part_name: &str) -> &str {
        resolve_part(&self.tables.parts, part_name)
    }

    /// Defect segment for a resolved part code and a free-text description.
    #[must_use]
    pub fn defect_segment(&self, part_code: &str, description: &str) -> &str {
        major_category(part_code)
            .and_then(|category| self.defect_types.digit_for(category, description))
            .unwrap_or(UNKNOWN_DEFECT)
    }
}

fn resolve_part<'a>(parts: &'a CodeTable, part_name: &str) -> &'a str {
    parts
        .code_for(part_name)
        .or_else(|| parts.code_by_containment(part_name))
        .unwrap_or(UNKNOWN_PART)
}

/// First character of a part code.
fn major_category(part_code: &str) -> Option<&str> {
    let end = part_code.chars().next()?.len_utf8();
    part_code.get(..end)
}

/// The four segments of a defect code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CodeBreakdown {
    /// Product code prefix.
    #[schema(example = "C03")]
    pub product: String,
    /// Process segment.
    #[schema(example = "B")]
    pub process: String,
    /// Part segment.
    #[schema(example = "501")]
    pub part: String,
    /// Defect segment.
    #[schema(example = "2")]
    pub defect: String,
}

/// A generated defect code with its breakdown.
///
/// `code` is always the concatenation of the breakdown segments in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DefectCode {
    /// Full code, e.g. `C03B5012`.
    #[schema(example = "C03B5012")]
    pub code: String,
    /// Individual segments.
    pub breakdown: CodeBreakdown,
    /// `"{part name} - {defect description}"`.
    #[schema(example = "솔밸브-온수 - 누수")]
    pub description: String,
}

impl DefectCode {
    fn assemble(breakdown: CodeBreakdown, part_name: &str, defect_description: &str) -> Self {
        let code = format!(
            "{}{}{}{}",
            breakdown.product, breakdown.process, breakdown.part, breakdown.defect
        );
        Self {
            code,
            breakdown,
            description: format!("{part_name} - {defect_description}"),
        }
    }
}

/// One observation to encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DefectObservation {
    /// Process name as entered.
    pub process_name: String,
    /// Part name as entered.
    pub part_name: String,
    /// Free-text defect description.
    pub defect_description: String,
}

/// Generate a defect code by looking every segment up in `book`.
///
/// # Examples
/// ```
/// use quality_backend::domain::{CodeBook, generate};
///
/// let code = generate(&CodeBook::default(), "C03", "없는공정", "없는부품", "없는불량");
/// assert_eq!(code.code, "C03B9999");
/// ```
#[must_use]
pub fn generate(
    book: &CodeBook,
    product_code: &str,
    process_name: &str,
    part_name: &str,
    defect_description: &str,
) -> DefectCode {
    let process = book.process_segment(process_name);
    let part = book.part_segment(part_name);
    let defect = book.defect_segment(part, defect_description);
    DefectCode::assemble(
        CodeBreakdown {
            product: product_code.to_owned(),
            process: process.to_owned(),
            part: part.to_owned(),
            defect: defect.to_owned(),
        },
        part_name,
        defect_description,
    )
}

/// Generate a defect code from already resolved process and part codes.
///
/// Only the defect segment is looked up.
#[must_use]
pub fn generate_from_codes(
    book: &CodeBook,
    product_code: &str,
    process_code: &str,
    part_code: &str,
    defect_description: &str,
    part_name: &str,
) -> DefectCode {
    let defect = book.defect_segment(part_code, defect_description);
    DefectCode::assemble(
        CodeBreakdown {
            product: product_code.to_owned(),
            process: process_code.to_owned(),
            part: part_code.to_owned(),
            defect: defect.to_owned(),
        },
        part_name,
        defect_description,
    )
}

/// Generate codes for several observations sharing one product code.
#[must_use]
pub fn generate_batch(
    book: &CodeBook,
    product_code: &str,
    observations: &[DefectObservation],
) -> Vec<DefectCode> {
    observations
        .iter()
        .map(|obs| {
            generate(
                book,
                product_code,
                &obs.process_name,
                &obs.part_name,
                &obs.defect_description,
            )
        })
        .collect()
}

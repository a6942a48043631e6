//! Regroup flat rows into nested documents.
//!
//! This is the inverse of the decoder's denormalization: rows are split by
//! origin, then by provider guide number, and each group becomes one claim.
//!
//! ```text
//! Flat rows                                   Nested claims
//! ┌──────────────────────────────────┐        ┌──────────────────────────┐
//! │ a.xte  G-1  proc 10101012        │        │ a.xte                    │
//! │ a.xte  G-1  proc 40301630        │   →    │   G-1: [10101012,        │
//! │ a.xte  G-2  (no procedure)       │        │         40301630]        │
//! │ b.xte  G-7  proc 10101012        │        │   G-2: []                │
//! └──────────────────────────────────┘        ├──────────────────────────┤
//!                                             │ b.xte                    │
//!                                             │   G-7: [10101012]        │
//!                                             └──────────────────────────┘
//! ```
//!
//! Claim-level fields come from the first row of each group; later rows only
//! contribute procedures.

use std::collections::{BTreeMap, HashMap};

use crate::dates;
use crate::field_map::{
    FieldKind, CLAIM_FIELDS, GUIDE_COLUMN, ORIGIN_COLUMN, PROCEDURE_CODE_COLUMN, PROCEDURE_FIELDS,
};
use crate::models::{self, Claim, FieldValues, Procedure, Record};

/// Rows per origin, in sorted origin order.
///
/// Rows with an empty origin cell belong to no document and are left out.
pub fn group_by_origin(records: &[Record]) -> BTreeMap<String, Vec<&Record>> {
    let mut origins: BTreeMap<String, Vec<&Record>> = BTreeMap::new();
    for record in records {
        if let Some(origin) = models::text(record, ORIGIN_COLUMN) {
            origins.entry(origin.to_string()).or_default().push(record);
        }
    }
    origins
}

/// Rows per provider guide number, in first-occurrence order.
///
/// Rows without a guide number form one group of their own.
pub fn group_by_guide<'a>(rows: &[&'a Record]) -> Vec<Vec<&'a Record>> {
    let mut index: HashMap<Option<&str>, usize> = HashMap::new();
    let mut groups: Vec<Vec<&'a Record>> = Vec::new();

    for &row in rows {
        let key = models::text(row, GUIDE_COLUMN);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }

    groups
}

/// Build the claims of one origin.
pub fn rows_to_claims(rows: &[&Record]) -> Vec<Claim> {
    group_by_guide(rows)
        .into_iter()
        .filter_map(|group| {
            let (first, _) = group.split_first()?;
            let mut builder = ClaimBuilder::new(first);
            for row in &group {
                builder.add_procedure(row);
            }
            Some(builder.build())
        })
        .collect()
}

/// Accumulates procedures while grouping.
struct ClaimBuilder {
    values: FieldValues,
    procedures: Vec<Procedure>,
}

impl ClaimBuilder {
    fn new(row: &Record) -> Self {
        let values = CLAIM_FIELDS
            .iter()
            .filter_map(|field| {
                let value = models::text(row, field.column)?;
                let value = match field.kind {
                    FieldKind::Date => dates::to_xml(value),
                    FieldKind::Text => value.to_string(),
                };
                Some((field.column, value))
            })
            .collect();

        Self {
            values,
            procedures: Vec::new(),
        }
    }

    /// Rows without a procedure code (a claim's placeholder row) add nothing.
    fn add_procedure(&mut self, row: &Record) {
        if models::text(row, PROCEDURE_CODE_COLUMN).is_none() {
            return;
        }
        let values = models::values_from_record(row, PROCEDURE_FIELDS.iter().map(|f| f.column));
        self.procedures.push(Procedure { values });
    }

    fn build(self) -> Claim {
        let mut claim = Claim {
            values: self.values,
            procedures: self.procedures,
        };
        claim.resolve_tax_id();
        claim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_map::{CNPJ_COLUMN, CPF_COLUMN};
    use crate::test_support::record;

    #[test]
    fn test_group_by_origin_sorted_and_skips_blank() {
        let records = vec![
            record(&[(ORIGIN_COLUMN, "b.xte")]),
            record(&[(ORIGIN_COLUMN, "a.xte")]),
            record(&[(ORIGIN_COLUMN, "  ")]),
            record(&[(ORIGIN_COLUMN, "b.xte")]),
            record(&[("numeroCarteira", "1")]),
        ];

        let origins = group_by_origin(&records);
        let keys: Vec<&str> = origins.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a.xte", "b.xte"]);
        assert_eq!(origins["b.xte"].len(), 2);
    }

    #[test]
    fn test_group_by_guide_first_occurrence_order_with_null_group() {
        let records = vec![
            record(&[(GUIDE_COLUMN, "G-2")]),
            record(&[(GUIDE_COLUMN, "G-1")]),
            record(&[]),
            record(&[(GUIDE_COLUMN, "G-2")]),
            record(&[(GUIDE_COLUMN, "")]),
        ];
        let rows: Vec<&Record> = records.iter().collect();

        let groups = group_by_guide(&rows);
        // G-2, G-1, and one group for both guide-less rows
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(models::text(groups[1][0], GUIDE_COLUMN), Some("G-1"));
        assert_eq!(groups[2].len(), 2);
    }

    #[test]
    fn test_claims_take_fields_from_first_row() {
        let records = vec![
            record(&[
                (GUIDE_COLUMN, "G-1"),
                ("nomeBeneficiario", "Ana"),
                ("dataNascimento", "20/05/1980"),
                (PROCEDURE_CODE_COLUMN, "10101012"),
                ("valorInformado", "10.00"),
            ]),
            record(&[
                (GUIDE_COLUMN, "G-1"),
                ("nomeBeneficiario", "Outra"),
                (PROCEDURE_CODE_COLUMN, "40301630"),
            ]),
        ];
        let rows: Vec<&Record> = records.iter().collect();

        let claims = rows_to_claims(&rows);
        assert_eq!(claims.len(), 1);
        let claim = &claims[0];
        assert_eq!(claim.values.get("nomeBeneficiario").map(String::as_str), Some("Ana"));
        assert_eq!(claim.values.get("dataNascimento").map(String::as_str), Some("1980-05-20"));
        assert_eq!(claim.procedures.len(), 2);
        assert_eq!(
            claim.procedures[0].values.get("valorInformado").map(String::as_str),
            Some("10.00")
        );
        // procedure fields never leak into claim values
        assert!(!claim.values.contains_key(PROCEDURE_CODE_COLUMN));
    }

    #[test]
    fn test_placeholder_row_adds_no_procedure() {
        let records = vec![record(&[(GUIDE_COLUMN, "G-9"), ("senha", "X")])];
        let rows: Vec<&Record> = records.iter().collect();

        let claims = rows_to_claims(&rows);
        assert_eq!(claims.len(), 1);
        assert!(claims[0].procedures.is_empty());
    }

    #[test]
    fn test_procedure_count_matches_rows_with_code() {
        let records = vec![
            record(&[(GUIDE_COLUMN, "G-1"), (PROCEDURE_CODE_COLUMN, "1")]),
            record(&[(GUIDE_COLUMN, "G-1")]),
            record(&[(GUIDE_COLUMN, "G-1"), (PROCEDURE_CODE_COLUMN, "2")]),
            record(&[(GUIDE_COLUMN, "G-2")]),
        ];
        let rows: Vec<&Record> = records.iter().collect();

        let claims = rows_to_claims(&rows);
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].procedures.len(), 2);
        assert_eq!(claims[1].procedures.len(), 0);
    }

    #[test]
    fn test_tax_id_precedence() {
        let records = vec![record(&[
            (GUIDE_COLUMN, "G-1"),
            (CPF_COLUMN, "12345678901"),
            (CNPJ_COLUMN, "12345678000199"),
        ])];
        let rows: Vec<&Record> = records.iter().collect();

        let claims = rows_to_claims(&rows);
        assert!(claims[0].values.contains_key(CPF_COLUMN));
        assert!(!claims[0].values.contains_key(CNPJ_COLUMN));
    }
}

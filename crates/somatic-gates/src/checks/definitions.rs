use crate::gate::{Gate, GateResult};
use crate::ids::{GateId, SectionId};
use crate::reason::ReasonCode;
use crate::rules::RuleSet;
use somatic_doc::{Document, Token, strip_bold, tokenize};

/// The Definitions section carries a recognized two-column table with
/// enough data rows.
pub struct DefinitionsGate;

impl Gate for DefinitionsGate {
    fn id(&self) -> GateId {
        GateId::Definitions
    }

    fn check(&self, doc: &Document, rules: &RuleSet) -> GateResult {
        let mut result = GateResult::new(self.id());
        let min_rows = rules.definitions.min_rows;

        let rows = rules
            .section(doc, SectionId::Definitions)
            .and_then(|section| table_rows(section.body(), rules));
        let Some(rows) = rows else {
            result.metric("definitions_rows", 0);
            let pairs: Vec<String> = rules
                .definitions
                .header_pairs
                .iter()
                .map(|[a, b]| format!("{a}/{b}"))
                .collect();
            result.fail(
                ReasonCode::MissingDefinitionsTable,
                format!(
                    "Definitions needs a 2-column table with a {} header.",
                    pairs.join(" or ")
                ),
            );
            return result;
        };

        result.metric("definitions_rows", rows);
        if rows < min_rows {
            result.fail(
                ReasonCode::DefinitionsTooFewRows,
                format!("Definitions table needs at least {min_rows} rows, found {rows}."),
            );
        }
        result
    }
}

/// Data rows under the first recognized header, or `None` without one.
fn table_rows(body: &str, rules: &RuleSet) -> Option<usize> {
    let lines = tokenize(body);
    let header = lines.windows(2).position(|pair| {
        matches!(&pair[0].token, Token::TableRow(cells) if is_header(cells, rules))
            && pair[1].token == Token::TableSeparator
    })?;
    let rows = lines[header + 2..]
        .iter()
        .take_while(|line| matches!(line.token, Token::TableRow(_)))
        .count();
    Some(rows)
}

fn is_header(cells: &[&str], rules: &RuleSet) -> bool {
    let [left, right] = cells else {
        return false;
    };
    let (left, right) = (strip_bold(left), strip_bold(right));
    rules
        .definitions
        .header_pairs
        .iter()
        .any(|[a, b]| left.eq_ignore_ascii_case(a) && right.eq_ignore_ascii_case(b))
}

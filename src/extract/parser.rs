use crate::dom::DomSnapshot;
use crate::error::{HarvestError, Result};
use crate::extract::align::strided;
use crate::extract::rule::{AlignmentPolicy, ExtractionRule, OnMissing, RowScope, RuleSet, ValueSource};
use indexmap::IndexMap;
use scraper::{ElementRef, Selector};

/// Ordered raw values of one logical field, as pulled from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldExtractionResult {
    pub values: Vec<String>,

    /// Ascending indexes of `values` that are the rule's default standing in for a missing value
    pub defaulted: Vec<usize>,
}

impl FieldExtractionResult {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: String, defaulted: bool) {
        if defaulted {
            self.defaulted.push(self.values.len());
        }
        self.values.push(value);
    }

    pub fn is_defaulted(&self, index: usize) -> bool {
        self.defaulted.binary_search(&index).is_ok()
    }

    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
        self.defaulted.retain(|&i| i < len);
    }
}

impl<S: Into<String>> FromIterator<S> for FieldExtractionResult {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { values: iter.into_iter().map(Into::into).collect(), defaulted: Vec::new() }
    }
}

/// One resolved node value
struct Resolved {
    value: String,
    defaulted: bool,
}

/// Field name to extracted values, in rule order
pub type ExtractedFields = IndexMap<String, FieldExtractionResult>;

struct CompiledRule {
    rule: ExtractionRule,
    selectors: Vec<Selector>,
    child: Option<Selector>,
    required_child: Option<Selector>,
}

struct CompiledRows {
    row: Selector,
    cell: Option<Selector>,
    min_cells: usize,
}

/// Turns a page snapshot into one value list per rule.
///
/// Extraction never fails once the rule table compiled: absent nodes either drop
/// out or become the rule's default value.
pub struct PageParser {
    rules: Vec<CompiledRule>,
    rows: Option<CompiledRows>,
}

fn compile_selector(field: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| HarvestError::InvalidRule {
        field: field.to_string(),
        reason: format!("invalid selector '{}': {}", css, e),
    })
}

impl PageParser {
    /// Validate the rule table and compile every selector once
    pub fn new(rule_set: &RuleSet) -> Result<Self> {
        rule_set.validate()?;

        let rules = rule_set
            .rules
            .iter()
            .map(|rule| {
                let selectors = rule
                    .selectors()
                    .map(|css| compile_selector(&rule.field, css))
                    .collect::<Result<Vec<_>>>()?;

                let child = match &rule.source {
                    ValueSource::ChildText { selector } => Some(compile_selector(&rule.field, selector)?),
                    _ => None,
                };

                let required_child = rule
                    .filter
                    .require_child
                    .as_deref()
                    .map(|css| compile_selector(&rule.field, css))
                    .transpose()?;

                Ok(CompiledRule { rule: rule.clone(), selectors, child, required_child })
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = rule_set.rows.as_ref().map(|scope| compile_rows(&rule_set.name, scope)).transpose()?;

        Ok(Self { rules, rows })
    }

    /// Extract every field from the snapshot
    pub fn parse(&self, snapshot: &DomSnapshot) -> ExtractedFields {
        let fields = match &self.rows {
            Some(rows) => self.parse_rows(snapshot, rows),
            None => self
                .rules
                .iter()
                .map(|compiled| (compiled.rule.field.clone(), extract_field(snapshot, compiled)))
                .collect(),
        };

        for (field, result) in &fields {
            log::debug!("Field '{}': {} values", field, result.len());
        }

        fields
    }

    fn parse_rows(&self, snapshot: &DomSnapshot, rows: &CompiledRows) -> ExtractedFields {
        let mut fields: ExtractedFields =
            self.rules.iter().map(|c| (c.rule.field.clone(), FieldExtractionResult::default())).collect();

        for (idx, row) in snapshot.document().select(&rows.row).enumerate() {
            let cells: Vec<ElementRef> = match &rows.cell {
                Some(cell) => row.select(cell).collect(),
                None => Vec::new(),
            };

            if cells.len() < rows.min_cells {
                log::warn!("Row {}: only {} cells, skipping", idx + 1, cells.len());
                continue;
            }

            for compiled in &self.rules {
                let scope = match compiled.rule.cell_index {
                    Some(i) => cells.get(i).copied(),
                    None => Some(row),
                };

                let resolved = scope
                    .and_then(|scope| first_value_in(scope, compiled))
                    .unwrap_or_else(|| Resolved { value: compiled.rule.default.clone(), defaulted: true });

                if let Some(result) = fields.get_mut(&compiled.rule.field) {
                    result.push(resolved.value, resolved.defaulted);
                }
            }
        }

        for compiled in &self.rules {
            if let (Some(max), Some(result)) = (compiled.rule.max_count, fields.get_mut(&compiled.rule.field)) {
                result.truncate(max);
            }
        }

        fields
    }
}

fn compile_rows(name: &str, scope: &RowScope) -> Result<CompiledRows> {
    Ok(CompiledRows {
        row: compile_selector(name, &scope.selector)?,
        cell: scope.cell.as_deref().map(|css| compile_selector(name, css)).transpose()?,
        min_cells: scope.min_cells,
    })
}

/// Page-wide extraction: select, stride, resolve, filter, cap
fn extract_field(snapshot: &DomSnapshot, compiled: &CompiledRule) -> FieldExtractionResult {
    let rule = &compiled.rule;

    let nodes: Vec<ElementRef> = compiled
        .selectors
        .iter()
        .map(|selector| snapshot.document().select(selector).collect::<Vec<_>>())
        .find(|nodes| !nodes.is_empty())
        .unwrap_or_default();

    let nodes = match rule.policy {
        AlignmentPolicy::StridedSelect { stride, offset } => strided(nodes, stride, offset),
        _ => nodes,
    };

    let max = rule.max_count.unwrap_or(usize::MAX);
    let mut result = FieldExtractionResult::default();
    for resolved in nodes.into_iter().filter_map(|node| node_value(node, compiled)).take(max) {
        result.push(resolved.value, resolved.defaulted);
    }
    result
}

/// Row-scoped extraction: first acceptable non-empty value across the selector chain
fn first_value_in(scope: ElementRef, compiled: &CompiledRule) -> Option<Resolved> {
    compiled
        .selectors
        .iter()
        .flat_map(|selector| scope.select(selector))
        .filter_map(|node| node_value(node, compiled))
        .find(|resolved| !resolved.value.is_empty())
}

/// Resolve one node to a value, or `None` if the rule drops it
fn node_value(node: ElementRef, compiled: &CompiledRule) -> Option<Resolved> {
    let rule = &compiled.rule;

    if let Some(required) = &compiled.required_child {
        node.select(required).next()?;
    }

    let raw = match &rule.source {
        ValueSource::Text => Some(node.text().collect::<String>()),
        ValueSource::Attribute { name } => node.value().attr(name).map(str::to_string),
        ValueSource::ChildText { .. } => compiled
            .child
            .as_ref()
            .and_then(|child| node.select(child).next())
            .map(|el| el.text().collect::<String>()),
    };

    let Some(raw) = raw else {
        return match rule.on_missing {
            OnMissing::Default => Some(Resolved { value: rule.default.clone(), defaulted: true }),
            OnMissing::Skip => None,
        };
    };

    let value = rule.transform.apply(&raw);
    rule.filter.accepts(&value).then_some(Resolved { value, defaulted: false })
}

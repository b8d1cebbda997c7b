use crate::error::{HarvestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Where a matched node's value comes from
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueSource {
    /// Concatenated text of the node
    #[default]
    Text,
    /// An attribute of the node, e.g. `href`
    Attribute { name: String },
    /// Text of the first descendant matching `selector`
    ChildText { selector: String },
}

/// What to do when a node exists but its value source does not
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OnMissing {
    /// Emit the rule's default value in place
    #[default]
    Default,
    /// Drop the node
    Skip,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextTransform {
    Raw,
    #[default]
    Trim,
    /// Trim and collapse inner whitespace runs to one space
    Collapse,
}

impl TextTransform {
    pub fn apply(&self, value: &str) -> String {
        match self {
            TextTransform::Raw => value.to_string(),
            TextTransform::Trim => value.trim().to_string(),
            TextTransform::Collapse => value.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// Inclusion/exclusion checks on extracted values.
///
/// Substring checks ignore ASCII case. Substituted defaults are never filtered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValueFilter {
    /// Drop nodes without a descendant matching this selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_child: Option<String>,

    /// Value must contain every one of these
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require_all: Vec<String>,

    /// Value must contain none of these
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_any: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_prefixes: Vec<String>,

    #[serde(default)]
    pub drop_empty: bool,
}

impl ValueFilter {
    pub fn accepts(&self, value: &str) -> bool {
        if self.drop_empty && value.is_empty() {
            return false;
        }

        let lowered = value.to_ascii_lowercase();

        if self.exclude_prefixes.iter().any(|p| lowered.starts_with(&p.to_ascii_lowercase())) {
            return false;
        }

        if self.exclude_any.iter().any(|s| lowered.contains(&s.to_ascii_lowercase())) {
            return false;
        }

        self.require_all.iter().all(|s| lowered.contains(&s.to_ascii_lowercase()))
    }
}

/// How a field's list is reconciled with the other fields of the page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// Right-pad with the rule's default up to the page's row count
    #[default]
    IndependentPad,

    /// Split each value into (first token, remainder) and emit two columns
    PairedSplit { first: String, second: String },

    /// Keep matches `offset, offset + stride, ...` of a query shared with other fields
    StridedSelect { stride: usize, offset: usize },
}

/// Declarative description of how one logical field is pulled out of a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionRule {
    /// Column name, or the source name for a paired split
    pub field: String,

    /// CSS selector for the nodes holding this field
    pub selector: String,

    /// Tried in order when `selector` matches nothing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,

    #[serde(default)]
    pub source: ValueSource,

    #[serde(default)]
    pub on_missing: OnMissing,

    #[serde(default)]
    pub filter: ValueFilter,

    #[serde(default)]
    pub transform: TextTransform,

    #[serde(default)]
    pub policy: AlignmentPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,

    /// Sentinel for missing values and padding
    #[serde(default)]
    pub default: String,

    /// In row-scoped rule sets, read from this cell of the row instead of the whole row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_index: Option<usize>,
}

impl ExtractionRule {
    pub fn new(field: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            selector: selector.into(),
            fallbacks: Vec::new(),
            source: ValueSource::Text,
            on_missing: OnMissing::Default,
            filter: ValueFilter::default(),
            transform: TextTransform::Trim,
            policy: AlignmentPolicy::IndependentPad,
            max_count: None,
            default: String::new(),
            cell_index: None,
        }
    }

    pub fn fallback(mut self, selector: impl Into<String>) -> Self {
        self.fallbacks.push(selector.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.source = ValueSource::Attribute { name: name.into() };
        self
    }

    pub fn child_text(mut self, selector: impl Into<String>) -> Self {
        self.source = ValueSource::ChildText { selector: selector.into() };
        self
    }

    pub fn skip_missing(mut self) -> Self {
        self.on_missing = OnMissing::Skip;
        self
    }

    pub fn require_child(mut self, selector: impl Into<String>) -> Self {
        self.filter.require_child = Some(selector.into());
        self
    }

    pub fn require_all<I, S>(mut self, needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.require_all.extend(needles.into_iter().map(Into::into));
        self
    }

    pub fn exclude_any<I, S>(mut self, needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.exclude_any.extend(needles.into_iter().map(Into::into));
        self
    }

    pub fn exclude_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.exclude_prefixes.extend(prefixes.into_iter().map(Into::into));
        self
    }

    pub fn drop_empty(mut self) -> Self {
        self.filter.drop_empty = true;
        self
    }

    pub fn transform(mut self, transform: TextTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn paired_split(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.policy = AlignmentPolicy::PairedSplit { first: first.into(), second: second.into() };
        self
    }

    pub fn strided(mut self, stride: usize, offset: usize) -> Self {
        self.policy = AlignmentPolicy::StridedSelect { stride, offset };
        self
    }

    pub fn max_count(mut self, max: usize) -> Self {
        self.max_count = Some(max);
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn cell(mut self, index: usize) -> Self {
        self.cell_index = Some(index);
        self
    }

    /// Columns this rule contributes to a row, in order
    pub fn output_columns(&self) -> Vec<&str> {
        match &self.policy {
            AlignmentPolicy::PairedSplit { first, second } => vec![first.as_str(), second.as_str()],
            _ => vec![self.field.as_str()],
        }
    }

    /// Selector chain: primary first, then fallbacks
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.selector.as_str()).chain(self.fallbacks.iter().map(String::as_str))
    }

    fn invalid(&self, reason: impl Into<String>) -> HarvestError {
        HarvestError::InvalidRule { field: self.field.clone(), reason: reason.into() }
    }
}

/// Restricts extraction to one value per matching row node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowScope {
    /// Selector for row nodes
    pub selector: String,

    /// Selector for cells within a row, used by rules with a `cell_index`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,

    /// Rows with fewer cells are skipped
    #[serde(default)]
    pub min_cells: usize,
}

/// An ordered rule table for one output schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSet {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<RowScope>,

    pub rules: Vec<ExtractionRule>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>, rules: Vec<ExtractionRule>) -> Self {
        Self { name: name.into(), rows: None, rules }
    }

    pub fn with_rows(mut self, rows: RowScope) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Load a rule table from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let rules: RuleSet = serde_json::from_str(&contents)?;
        rules.validate()?;

        log::info!("Loaded rule set '{}' ({} rules) from {}", rules.name, rules.rules.len(), path.display());
        Ok(rules)
    }

    /// Output schema, in rule order
    pub fn columns(&self) -> Vec<String> {
        self.rules.iter().flat_map(|r| r.output_columns()).map(str::to_string).collect()
    }

    /// Check the table for problems that would silently corrupt row alignment.
    ///
    /// Selector syntax is checked when the table is compiled by the parser.
    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(HarvestError::Config(format!("rule set '{}' has no rules", self.name)));
        }
        if let Some(rows) = &self.rows {
            if rows.min_cells > 0 && rows.cell.is_none() {
                return Err(HarvestError::Config(format!(
                    "rule set '{}': min_cells {} needs a cell selector, every row would be skipped",
                    self.name, rows.min_cells
                )));
            }
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.field.trim().is_empty() {
                return Err(rule.invalid("field name is empty"));
            }
            for column in rule.output_columns() {
                if !seen.insert(column) {
                    return Err(rule.invalid(format!("column '{}' is produced twice", column)));
                }
            }
            if rule.cell_index.is_some() && self.rows.as_ref().and_then(|r| r.cell.as_ref()).is_none() {
                return Err(rule.invalid("cell_index needs a row scope with a cell selector"));
            }
        }

        self.validate_strides()
    }

    /// Strided rules sharing one query must agree on the stride and claim distinct offsets.
    fn validate_strides(&self) -> Result<()> {
        let mut groups: HashMap<&str, (usize, HashSet<usize>)> = HashMap::new();

        for rule in &self.rules {
            let AlignmentPolicy::StridedSelect { stride, offset } = rule.policy else {
                continue;
            };

            if self.rows.is_some() {
                return Err(rule.invalid("strided selection is meaningless inside a row scope"));
            }
            if stride == 0 {
                return Err(rule.invalid("stride must be at least 1"));
            }
            if offset >= stride {
                return Err(rule.invalid(format!("offset {} must be below stride {}", offset, stride)));
            }
            if !rule.fallbacks.is_empty() {
                return Err(rule.invalid("strided rules cannot have fallback selectors"));
            }

            let (group_stride, offsets) = groups.entry(rule.selector.as_str()).or_insert((stride, HashSet::new()));
            if *group_stride != stride {
                return Err(rule.invalid(format!(
                    "stride {} disagrees with stride {} used by another field on '{}'",
                    stride, group_stride, rule.selector
                )));
            }
            if !offsets.insert(offset) {
                return Err(rule.invalid(format!("offset {} on '{}' is already claimed", offset, rule.selector)));
            }
        }

        Ok(())
    }
}

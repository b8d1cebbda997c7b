//! Built-in rule tables for the list layouts this tool was written against

use crate::extract::rule::{ExtractionRule, RowScope, RuleSet};

const CONTACT_LINK: &str = "a.zp-link.zp_OotKe";
const SHARED_CELL: &str = "span.zp_Y6y8d";

/// The full contact schema: eleven columns, extracted page-wide and aligned by position.
///
/// `region` keeps only locations that mention it (e.g. "Australia").
pub fn contacts(region: &str) -> RuleSet {
    RuleSet::new(
        "contacts",
        vec![
            ExtractionRule::new("Business Name", "div.zp_J1j17").child_text("a").default_value("Company not found"),
            ExtractionRule::new("Website", CONTACT_LINK)
                .attribute("href")
                .skip_missing()
                .exclude_prefixes(["#"])
                .exclude_any(["facebook", "linkedin", "twitter", "apollo"])
                .default_value("Website not specified"),
            ExtractionRule::new("Niche", "span.zp_PHqgZ.zp_TNdhR").max_count(25),
            ExtractionRule::new("Country", SHARED_CELL).require_all([region]),
            ExtractionRule::new("Name", "div.zp_xVJ20").require_child("a").paired_split("First Name", "Last Name"),
            ExtractionRule::new("Job Title", SHARED_CELL).strided(3, 0),
            ExtractionRule::new("Phone number", "span.zp_lm1kV").child_text("a").skip_missing(),
            ExtractionRule::new("Personal email", "div.zp_jcL6a").child_text("a.zp-link.zp_OotKe.zp_Iu6Pf"),
            ExtractionRule::new("Personal LinkedIn", CONTACT_LINK)
                .attribute("href")
                .skip_missing()
                .require_all(["linkedin"])
                .exclude_any(["company"]),
            ExtractionRule::new("Company LinkedIn", CONTACT_LINK)
                .attribute("href")
                .skip_missing()
                .require_all(["linkedin", "company"])
                .default_value("LinkedIn page not specified"),
        ],
    )
}

/// The simplified `{Full Name, Job Title, Company}` schema, extracted page-wide
pub fn people() -> RuleSet {
    RuleSet::new(
        "people",
        vec![
            ExtractionRule::new("Full Name", "div[data-testid=\"contact-name-cell\"] a").drop_empty(),
            ExtractionRule::new("Job Title", SHARED_CELL).strided(3, 0),
            ExtractionRule::new("Company", "div.zp_J1j17").child_text("a").default_value("Company not found"),
        ],
    )
}

/// The simplified schema extracted one row at a time; updated titles and
/// companies win over the originals.
pub fn people_rows() -> RuleSet {
    RuleSet::new(
        "people_rows",
        vec![
            ExtractionRule::new("Full Name", "div[data-testid=\"contact-name-cell\"] a")
                .cell(0)
                .default_value("Unknown Name"),
            ExtractionRule::new("Job Title", "span.zp_pMqXp span.zp_xvo3G")
                .fallback("span.zp_FEm_X")
                .cell(1)
                .default_value("Unknown Title"),
            ExtractionRule::new("Company", "span.zp_pMqXp span.zp_xvo3G")
                .fallback("span.zp_xvo3G")
                .cell(2)
                .default_value("Unknown Company"),
        ],
    )
    .with_rows(RowScope {
        selector: "div.zp_Uiy0R[role=\"row\"]".to_string(),
        cell: Some("div.zp_egyXf[role=\"cell\"]:not(.zp_xk8LG)".to_string()),
        min_cells: 3,
    })
}

/// Look up a preset by name
pub fn by_name(name: &str, region: &str) -> Option<RuleSet> {
    match name {
        "contacts" => Some(contacts(region)),
        "people" => Some(people()),
        "people_rows" | "people-rows" => Some(people_rows()),
        _ => None,
    }
}

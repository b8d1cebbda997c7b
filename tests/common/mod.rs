#![allow(dead_code)]

use contact_harvest::browser::{BrowserDriver, ElementLocator};
use contact_harvest::{HarvestError, Result, SessionConfig};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const LOGIN_URL: &str = "https://app.test/#/login";
pub const LIST_URL: &str = "https://app.test/#/people";
pub const HOME_URL: &str = "https://app.test/#/home";

pub const EMAIL: &str = r#"input[name="email"]"#;
pub const PASSWORD: &str = r#"input[name="password"]"#;
pub const SUBMIT: &str = r#"button[type="submit"]"#;
pub const NEXT: &str = r#"button[aria-label="Next"]"#;
pub const NEXT_STYLED: &str = r#"button[aria-label="Next"].zp_NbJqo.zp_hgBYR"#;

const CHALLENGE_PAGE: &str = "<html><body><h1>Checking your browser before accessing app.test</h1><p>Ray ID: 42</p></body></html>";
const LOGIN_PAGE: &str = r#"<html><body><form><input name="email"><input name="password"><button type="submit">Log In</button></form></body></html>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Blank,
    Login,
    Home,
    List(usize),
}

#[derive(Debug)]
struct Script {
    location: Location,
    pages: Vec<String>,
    login_form: bool,
    accept_login: bool,
    logged_in: bool,
    challenge_reads: usize,
    unreadable: HashSet<usize>,
    unclickable: HashSet<String>,
    hidden: HashSet<String>,
    typed: Vec<(String, String)>,
    clicks: Vec<String>,
    screenshots: Vec<PathBuf>,
    page_reads: usize,
}

/// An in-memory site with a login form and a paginated list
#[derive(Debug)]
pub struct ScriptedDriver {
    script: RefCell<Script>,
}

impl ScriptedDriver {
    /// A site whose list has one entry in `pages` per list page
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            script: RefCell::new(Script {
                location: Location::Blank,
                pages,
                login_form: true,
                accept_login: true,
                logged_in: false,
                challenge_reads: 0,
                unreadable: HashSet::new(),
                unclickable: HashSet::new(),
                hidden: HashSet::new(),
                typed: Vec::new(),
                clicks: Vec::new(),
                screenshots: Vec::new(),
                page_reads: 0,
            }),
        }
    }

    /// The login page renders without its form
    pub fn without_login_form(self) -> Self {
        self.script.borrow_mut().login_form = false;
        self
    }

    /// Submitting the form leaves the browser on the login page
    pub fn rejecting_login(self) -> Self {
        self.script.borrow_mut().accept_login = false;
        self
    }

    /// The next `reads` page-source reads return a challenge page
    pub fn with_challenge(self, reads: usize) -> Self {
        self.script.borrow_mut().challenge_reads = reads;
        self
    }

    /// Reading list page `ordinal` fails
    pub fn unreadable_page(self, ordinal: usize) -> Self {
        self.script.borrow_mut().unreadable.insert(ordinal);
        self
    }

    /// `selector` can be found but not clicked
    pub fn unclickable(self, selector: &str) -> Self {
        self.script.borrow_mut().unclickable.insert(selector.to_string());
        self
    }

    /// `selector` is never present
    pub fn hidden(self, selector: &str) -> Self {
        self.script.borrow_mut().hidden.insert(selector.to_string());
        self
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.script.borrow().typed.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.script.borrow().clicks.clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.script.borrow().screenshots.clone()
    }

    /// Number of list pages whose source was read
    pub fn page_reads(&self) -> usize {
        self.script.borrow().page_reads
    }

    pub fn current_page(&self) -> Option<usize> {
        match self.script.borrow().location {
            Location::List(i) => Some(i + 1),
            _ => None,
        }
    }
}

impl Script {
    fn has(&self, css: &str) -> bool {
        if self.hidden.contains(css) {
            return false;
        }
        match (self.location, css) {
            (Location::Login, EMAIL | PASSWORD | SUBMIT) => self.login_form,
            (Location::List(i), NEXT | NEXT_STYLED) => i + 1 < self.pages.len(),
            _ => false,
        }
    }
}

impl BrowserDriver for ScriptedDriver {
    fn navigate(&self, url: &str) -> Result<()> {
        let mut script = self.script.borrow_mut();
        script.location = match url {
            LOGIN_URL => Location::Login,
            LIST_URL if script.logged_in => Location::List(0),
            LIST_URL => Location::Login,
            _ => Location::Blank,
        };
        Ok(())
    }

    fn find_element(&self, css_selector: &str) -> Result<ElementLocator> {
        if self.script.borrow().has(css_selector) {
            Ok(ElementLocator::new(css_selector))
        } else {
            Err(HarvestError::ElementNotFound(css_selector.to_string()))
        }
    }

    fn click(&self, element: &ElementLocator) -> Result<()> {
        let mut script = self.script.borrow_mut();
        let css = element.css_selector.as_str();

        if script.unclickable.contains(css) || !script.has(css) {
            return Err(HarvestError::InteractionFailed { selector: css.to_string(), reason: "not clickable".into() });
        }
        script.clicks.push(css.to_string());

        match (script.location, css) {
            (Location::Login, SUBMIT) if script.accept_login => {
                script.logged_in = true;
                script.location = Location::Home;
            }
            (Location::List(i), NEXT | NEXT_STYLED) => script.location = Location::List(i + 1),
            _ => {}
        }
        Ok(())
    }

    fn type_text(&self, element: &ElementLocator, text: &str) -> Result<()> {
        self.script.borrow_mut().typed.push((element.css_selector.clone(), text.to_string()));
        Ok(())
    }

    fn page_source(&self) -> Result<String> {
        let mut script = self.script.borrow_mut();
        if script.challenge_reads > 0 {
            script.challenge_reads -= 1;
            return Ok(CHALLENGE_PAGE.to_string());
        }

        match script.location {
            Location::List(i) => {
                if script.unreadable.contains(&(i + 1)) {
                    return Err(HarvestError::PageReadFailed(format!("page {} went away", i + 1)));
                }
                script.page_reads += 1;
                Ok(script.pages[i].clone())
            }
            Location::Login => Ok(LOGIN_PAGE.to_string()),
            _ => Ok("<html><body></body></html>".to_string()),
        }
    }

    fn current_url(&self) -> Result<String> {
        Ok(match self.script.borrow().location {
            Location::Blank => "about:blank".to_string(),
            Location::Login => LOGIN_URL.to_string(),
            Location::Home => HOME_URL.to_string(),
            Location::List(i) => format!("{}?page={}", LIST_URL, i + 1),
        })
    }

    fn screenshot(&self, path: &Path) -> Result<()> {
        self.script.borrow_mut().screenshots.push(path.to_path_buf());
        Ok(())
    }
}

/// Session settings for the scripted site, with every wait immediate
pub fn session_config() -> SessionConfig {
    SessionConfig::new(LOGIN_URL, LIST_URL).without_delays()
}

/// A list page in the row layout of the `people_rows` preset
pub fn people_page(people: &[(&str, &str, &str)]) -> String {
    let rows: String = people
        .iter()
        .map(|(name, title, company)| {
            format!(
                r##"<div class="zp_Uiy0R" role="row">
                     <div class="zp_egyXf zp_xk8LG" role="cell"><input type="checkbox"></div>
                     <div class="zp_egyXf" role="cell"><div data-testid="contact-name-cell"><a href="#">{name}</a></div></div>
                     <div class="zp_egyXf" role="cell"><span class="zp_pMqXp"><span class="zp_xvo3G">{title}</span></span></div>
                     <div class="zp_egyXf" role="cell"><span class="zp_xvo3G">{company}</span></div>
                   </div>"##
            )
        })
        .collect();
    format!("<html><body><div role=\"grid\">{}</div></body></html>", rows)
}

/// A page in the layout of the `contacts` preset, with ragged field lists.
///
/// Three people; the third has a one-word name, no company link, no website,
/// no niche and a location outside Australia. Only the first has a phone
/// number, an email and LinkedIn profiles.
pub fn contacts_page() -> String {
    r##"<html><body>
        <div class="zp_xVJ20">Name</div>
        <div class="zp_xVJ20"><a>Ada Lovelace</a></div>
        <div class="zp_xVJ20"><a>Grace Hopper</a></div>
        <div class="zp_xVJ20"><a>Plato</a></div>

        <span class="zp_Y6y8d">Analyst</span><span class="zp_Y6y8d">Sydney, Australia</span><span class="zp_Y6y8d">Engines Ltd</span>
        <span class="zp_Y6y8d">Admiral</span><span class="zp_Y6y8d">Melbourne, Australia</span><span class="zp_Y6y8d">Navy</span>
        <span class="zp_Y6y8d">Philosopher</span><span class="zp_Y6y8d">Athens, Greece</span><span class="zp_Y6y8d">Academy</span>

        <div class="zp_J1j17"><a>Engines Ltd</a></div>
        <div class="zp_J1j17"><a>US Navy</a></div>
        <div class="zp_J1j17"><span>hidden</span></div>

        <a class="zp-link zp_OotKe" href="https://engines.example.com">site</a>
        <a class="zp-link zp_OotKe" href="https://www.linkedin.com/company/engines">company page</a>
        <a class="zp-link zp_OotKe" href="https://facebook.com/engines">facebook</a>
        <a class="zp-link zp_OotKe" href="https://www.linkedin.com/in/ada">profile</a>
        <a class="zp-link zp_OotKe" href="https://navy.example.com">site</a>
        <a class="zp-link zp_OotKe" href="#">top</a>

        <span class="zp_PHqgZ zp_TNdhR">Computing</span>
        <span class="zp_PHqgZ zp_TNdhR">Defense</span>

        <span class="zp_lm1kV"><a>+61 2 5550 1234</a></span>
        <span class="zp_lm1kV">Request phone</span>

        <div class="zp_jcL6a"><a class="zp-link zp_OotKe zp_Iu6Pf">ada@engines.example.com</a></div>
        <div class="zp_jcL6a"><span>Access email</span></div>
    </body></html>"##
        .to_string()
}

/// Every column of [`contacts_page`] once aligned, in schema order
pub fn contacts_page_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec![
            "Engines Ltd",
            "https://engines.example.com",
            "Computing",
            "Sydney, Australia",
            "Ada",
            "Lovelace",
            "Analyst",
            "+61 2 5550 1234",
            "ada@engines.example.com",
            "https://www.linkedin.com/in/ada",
            "https://www.linkedin.com/company/engines",
        ],
        vec![
            "US Navy",
            "https://navy.example.com",
            "Defense",
            "Melbourne, Australia",
            "Grace",
            "Hopper",
            "Admiral",
            "",
            "",
            "",
            "LinkedIn page not specified",
        ],
        vec![
            "Company not found",
            "Website not specified",
            "",
            "",
            "Plato",
            "",
            "Philosopher",
            "",
            "",
            "",
            "LinkedIn page not specified",
        ],
    ]
}

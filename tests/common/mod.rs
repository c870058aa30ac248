#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use posting_harvest::error::WebDriverError;
use posting_harvest::profile::{SiteProfile, Timing};
use posting_harvest::webdriver::{By, Driver, ElementRef, Rect, Scroll};

pub const CARD: &str = ".JobCard_JobCard__aVx71";
pub const LABEL: &str = ".wds-17nsd6i";
pub const VALUE: &str = ".wds-h4ga6o";
pub const COMPANY: &str = "[data-company-name]";
pub const REVEAL_CLASS: &str = ".wds-j7905l";
pub const REVEAL_ICON: &str = ".wds-n3z0cp";
pub const REVEAL_TEXT: &str = "//button[contains(normalize-space(.), '상세 정보 더 보기')]";
pub const ANCESTOR_BUTTON: &str = "./ancestor::button";

/// Built-in profile with every wait and settle period zeroed.
pub fn fast_profile() -> SiteProfile {
    let mut profile = SiteProfile::builtin().unwrap();
    profile.timing = Timing {
        page_settle_ms: 0,
        scroll_settle_ms: 0,
        card_wait_ms: 0,
        reveal_wait_ms: 0,
        reveal_focus_ms: 0,
        growth_wait_ms: 0,
        visibility_wait_ms: 0,
        fallback_delay_ms: 0,
        post_reveal_settle_ms: 0,
        poll_interval_ms: 1,
    };
    profile
}

pub fn posting_url(id: u32) -> String {
    format!("https://www.wanted.co.kr/wd/{id}")
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub top: f64,
    pub displayed: bool,
    pub children: HashMap<String, Vec<String>>,
}

impl Node {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            text: String::new(),
            attrs: HashMap::new(),
            top: 0.0,
            displayed: true,
            children: HashMap::new(),
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn top(mut self, top: f64) -> Self {
        self.top = top;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn child(mut self, selector: &str, ids: &[&str]) -> Self {
        self.children.insert(
            selector.to_string(),
            ids.iter().map(|id| id.to_string()).collect(),
        );
        self
    }
}

/// A scripted page: which element ids each selector matches, plus changes
/// triggered by scrolling to the bottom or clicking.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub source: String,
    pub matches: HashMap<String, Vec<String>>,
    pub growth: Vec<Vec<(String, String)>>,
    pub on_click: HashMap<String, Vec<(String, String)>>,
    pub shown_on_click: HashMap<String, Vec<String>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, html: &str) -> Self {
        self.source = html.to_string();
        self
    }

    pub fn with(mut self, selector: &str, ids: &[&str]) -> Self {
        self.matches
            .entry(selector.to_string())
            .or_default()
            .extend(ids.iter().map(|id| id.to_string()));
        self
    }

    /// Appended to `selector`'s matches on the next scroll to the bottom.
    pub fn grow(mut self, selector: &str, ids: &[&str]) -> Self {
        self.growth.push(
            ids.iter()
                .map(|id| (selector.to_string(), id.to_string()))
                .collect(),
        );
        self
    }

    /// Appended to `selector`'s matches once `control` is clicked.
    pub fn reveal(mut self, control: &str, selector: &str, ids: &[&str]) -> Self {
        self.on_click
            .entry(control.to_string())
            .or_default()
            .extend(ids.iter().map(|id| (selector.to_string(), id.to_string())));
        self
    }

    /// Hidden elements `ids` become displayed once `control` is clicked.
    pub fn show(mut self, control: &str, ids: &[&str]) -> Self {
        self.shown_on_click
            .entry(control.to_string())
            .or_default()
            .extend(ids.iter().map(|id| id.to_string()));
        self
    }
}

#[derive(Default)]
struct Live {
    url: Option<String>,
    matches: HashMap<String, Vec<String>>,
    shown: HashSet<String>,
    grown: usize,
}

#[derive(Default)]
pub struct FakeDriver {
    pages: HashMap<String, FakePage>,
    nodes: HashMap<String, Node>,
    failing: HashSet<String>,
    unclickable: HashSet<String>,
    live: RefCell<Live>,
    navigations: RefCell<Vec<String>>,
    clicks: RefCell<Vec<String>>,
    displayed_checks: RefCell<Vec<String>>,
    scrolls: Cell<usize>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn node(mut self, node: Node) -> Self {
        self.nodes.insert(node.id.clone(), node);
        self
    }

    pub fn nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        for node in nodes {
            self.nodes.insert(node.id.clone(), node);
        }
        self
    }

    pub fn fail_navigation(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Clicks on `id` are recorded and then rejected by the browser.
    pub fn fail_click(mut self, id: &str) -> Self {
        self.unclickable.insert(id.to_string());
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.borrow().clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.borrow().clone()
    }

    /// Element ids passed to `is_displayed`, in call order.
    pub fn displayed_checks(&self) -> Vec<String> {
        self.displayed_checks.borrow().clone()
    }

    pub fn scrolls(&self) -> usize {
        self.scrolls.get()
    }

    fn current_page(&self) -> Option<&FakePage> {
        let live = self.live.borrow();
        live.url.as_ref().and_then(|url| self.pages.get(url))
    }

    fn node_for(&self, element: &ElementRef) -> Result<&Node, WebDriverError> {
        self.nodes.get(&element.0).ok_or_else(|| WebDriverError::Protocol {
            error: "no such element".into(),
            message: format!("unknown element {}", element.0),
        })
    }

    fn shown(&self, node: &Node) -> bool {
        node.displayed || self.live.borrow().shown.contains(&node.id)
    }
}

impl Driver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<(), WebDriverError> {
        self.navigations.borrow_mut().push(url.to_string());
        if self.failing.contains(url) {
            return Err(WebDriverError::Protocol {
                error: "timeout".into(),
                message: format!("navigation to {url} timed out"),
            });
        }
        let mut live = self.live.borrow_mut();
        live.url = Some(url.to_string());
        live.matches = self
            .pages
            .get(url)
            .map(|page| page.matches.clone())
            .unwrap_or_default();
        live.shown.clear();
        live.grown = 0;
        Ok(())
    }

    async fn find_all(&self, by: &By) -> Result<Vec<ElementRef>, WebDriverError> {
        let live = self.live.borrow();
        Ok(live
            .matches
            .get(by.value())
            .map(|ids| ids.iter().cloned().map(ElementRef).collect())
            .unwrap_or_default())
    }

    async fn find_all_in(
        &self,
        parent: &ElementRef,
        by: &By,
    ) -> Result<Vec<ElementRef>, WebDriverError> {
        let node = self.node_for(parent)?;
        Ok(node
            .children
            .get(by.value())
            .map(|ids| ids.iter().cloned().map(ElementRef).collect())
            .unwrap_or_default())
    }

    async fn attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, WebDriverError> {
        Ok(self.node_for(element)?.attrs.get(name).cloned())
    }

    async fn text(&self, element: &ElementRef) -> Result<String, WebDriverError> {
        let node = self.node_for(element)?;
        Ok(if self.shown(node) {
            node.text.clone()
        } else {
            String::new()
        })
    }

    async fn rect(&self, element: &ElementRef) -> Result<Rect, WebDriverError> {
        let node = self.node_for(element)?;
        Ok(Rect {
            x: 0.0,
            y: node.top,
            width: 100.0,
            height: 20.0,
        })
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, WebDriverError> {
        self.displayed_checks.borrow_mut().push(element.0.clone());
        let node = self.node_for(element)?;
        Ok(self.shown(node))
    }

    async fn click(&self, element: &ElementRef) -> Result<(), WebDriverError> {
        self.node_for(element)?;
        self.clicks.borrow_mut().push(element.0.clone());
        if self.unclickable.contains(&element.0) {
            return Err(WebDriverError::Protocol {
                error: "element click intercepted".into(),
                message: format!("{} is covered by another element", element.0),
            });
        }
        let (revealed, shown) = self
            .current_page()
            .map(|page| {
                (
                    page.on_click.get(&element.0).cloned().unwrap_or_default(),
                    page.shown_on_click.get(&element.0).cloned().unwrap_or_default(),
                )
            })
            .unwrap_or_default();
        let mut live = self.live.borrow_mut();
        for (selector, id) in revealed {
            live.matches.entry(selector).or_default().push(id);
        }
        live.shown.extend(shown);
        Ok(())
    }

    async fn scroll(&self, to: Scroll<'_>) -> Result<(), WebDriverError> {
        self.scrolls.set(self.scrolls.get() + 1);
        if !matches!(to, Scroll::Bottom) {
            return Ok(());
        }
        let next = {
            let live = self.live.borrow();
            self.current_page()
                .and_then(|page| page.growth.get(live.grown).cloned())
        };
        let mut live = self.live.borrow_mut();
        if let Some(batch) = next {
            live.grown += 1;
            for (selector, id) in batch {
                live.matches.entry(selector).or_default().push(id);
            }
        }
        Ok(())
    }

    async fn page_source(&self) -> Result<String, WebDriverError> {
        Ok(self
            .current_page()
            .map(|page| page.source.clone())
            .unwrap_or_default())
    }
}

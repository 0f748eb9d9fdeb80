//! Element-finding: native CDP strategies, XPath construction, and the
//! `query` shorthand grammar. Shared by [`crate::tab::Tab`] and
//! [`crate::element::WebElement`], each of which only needs to supply a
//! `Connection` and an optional root object id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use devtool_cdp::protocol::dom::{
    DescribeNodeParams, DescribeNodeResult, GetAttributesParams, GetAttributesResult,
    RequestNodeParams, RequestNodeResult,
};
use devtool_cdp::protocol::runtime::{CallFunctionOnParams, EvaluateParams, EvaluateResult};
use devtool_cdp::Connection;

use crate::element::WebElement;
use crate::error::CoreError;

/// How an element was found, carried onto the resulting [`WebElement`] for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    /// `find(id = ...)` with no other criteria: `document.querySelector("#...")`.
    Id,
    /// `find(class_name = ...)` with no other criteria.
    ClassName,
    /// `find(name = ...)` with no other criteria.
    Name,
    /// `find(tag_name = ...)` with no other criteria.
    TagName,
    /// A `query()` expression resolved as a CSS selector.
    Css,
    /// A `find()` with combined criteria, or a `query()` expression starting
    /// with `//` or `./`.
    XPath,
}

/// Criteria for [`Locator::find`].
#[derive(Debug, Clone, Default)]
pub struct FindCriteria {
    /// Match on `id`.
    pub id: Option<String>,
    /// Match on one class in `class`.
    pub class_name: Option<String>,
    /// Match on `name`.
    pub name: Option<String>,
    /// Match on the tag name.
    pub tag_name: Option<String>,
    /// Match on exact, whitespace-normalized text content.
    pub text: Option<String>,
    /// Arbitrary extra `[@key="value"]` attribute constraints.
    pub attributes: HashMap<String, String>,
    /// How long to poll before giving up; zero means a single attempt.
    pub timeout: Duration,
    /// Return every match instead of just the first.
    pub find_all: bool,
    /// Raise [`CoreError::ElementNotFound`] / [`CoreError::WaitElementTimeout`]
    /// on a miss instead of returning an empty result.
    pub raise_exc: bool,
}

impl FindCriteria {
    /// Criteria with no constraints set and `raise_exc = true`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raise_exc: true,
            ..Self::default()
        }
    }

    /// Match on `id`.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Match on one class.
    #[must_use]
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Match on `name`.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Match on the tag name.
    #[must_use]
    pub fn tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = Some(tag_name.into());
        self
    }

    /// Match on exact text content.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add an arbitrary attribute constraint.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Poll for up to `timeout` before giving up.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return every match.
    #[must_use]
    pub fn find_all(mut self, find_all: bool) -> Self {
        self.find_all = find_all;
        self
    }

    /// Whether a miss raises or returns empty.
    #[must_use]
    pub fn raise_exc(mut self, raise_exc: bool) -> Self {
        self.raise_exc = raise_exc;
        self
    }
}

/// Either execution strategy a [`FindCriteria`]/query expression resolves to.
#[derive(Debug, Clone)]
enum Strategy {
    Css(String),
    XPath(String),
}

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Types that can locate [`WebElement`]s: [`crate::tab::Tab`] (searching the
/// whole document) and [`WebElement`] itself (searching its own subtree).
pub trait Locator: Send + Sync {
    /// The connection to issue `Runtime`/`DOM` commands on.
    fn connection(&self) -> &Arc<Connection>;

    /// `None` when searching the whole document (a Tab); `Some(object_id)`
    /// when searching relative to an element.
    fn root_object_id(&self) -> Option<&str>;

    /// Find elements matching `criteria`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ElementNotFound`] or [`CoreError::WaitElementTimeout`]
    /// on a miss with `raise_exc = true`; propagates [`CoreError::Cdp`] on
    /// protocol failure.
    fn find(
        &self,
        criteria: FindCriteria,
    ) -> impl std::future::Future<Output = Result<Vec<WebElement>, CoreError>> + Send {
        async move {
            let relative = self.root_object_id().is_some();
            let (search_method, selector, strategy) = build_strategy(&criteria, relative);
            poll_for_elements(
                self.connection().clone(),
                self.root_object_id().map(str::to_string),
                strategy,
                criteria.find_all,
                criteria.timeout,
                criteria.raise_exc,
                search_method,
                selector,
            )
            .await
        }
    }

    /// Find elements matching a raw CSS or XPath `expression`.
    ///
    /// # Errors
    ///
    /// Same as [`Locator::find`].
    fn query(
        &self,
        expression: &str,
        timeout: Duration,
        find_all: bool,
        raise_exc: bool,
    ) -> impl std::future::Future<Output = Result<Vec<WebElement>, CoreError>> + Send {
        let expression = expression.to_string();
        async move {
            let strategy = classify_query_expression(&expression);
            let search_method = match &strategy {
                Strategy::Css(_) => SearchMethod::Css,
                Strategy::XPath(_) => SearchMethod::XPath,
            };
            poll_for_elements(
                self.connection().clone(),
                self.root_object_id().map(str::to_string),
                strategy,
                find_all,
                timeout,
                raise_exc,
                search_method,
                expression,
            )
            .await
        }
    }
}

/// Build the native-or-XPath strategy for `criteria`. Promotes to XPath as
/// soon as more than one constraint is present, since no single native CDP
/// strategy can combine them.
fn build_strategy(criteria: &FindCriteria, relative: bool) -> (SearchMethod, String, Strategy) {
    let native_count = [
        criteria.id.is_some(),
        criteria.class_name.is_some(),
        criteria.name.is_some(),
        criteria.tag_name.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count();
    let purely_native = native_count == 1 && criteria.attributes.is_empty() && criteria.text.is_none();

    if purely_native {
        if let Some(id) = &criteria.id {
            let selector = format!("#{}", css_escape_ident(id));
            return (SearchMethod::Id, selector.clone(), Strategy::Css(selector));
        }
        if let Some(class) = &criteria.class_name {
            let selector = format!(".{}", css_escape_ident(class));
            return (SearchMethod::ClassName, selector.clone(), Strategy::Css(selector));
        }
        if let Some(name) = &criteria.name {
            let selector = format!("[name=\"{}\"]", escape_css_attr_value(name));
            return (SearchMethod::Name, selector.clone(), Strategy::Css(selector));
        }
        if let Some(tag) = &criteria.tag_name {
            return (SearchMethod::TagName, tag.clone(), Strategy::Css(tag.clone()));
        }
    }

    let mut xpath = match &criteria.tag_name {
        Some(tag) => format!("//{tag}"),
        None => "//*".to_string(),
    };
    if let Some(id) = &criteria.id {
        xpath.push_str(&format!("[@id={}]", xpath_literal(id)));
    }
    if let Some(name) = &criteria.name {
        xpath.push_str(&format!("[@name={}]", xpath_literal(name)));
    }
    let mut attribute_keys: Vec<&String> = criteria.attributes.keys().collect();
    attribute_keys.sort();
    for key in attribute_keys {
        xpath.push_str(&format!("[@{key}={}]", xpath_literal(&criteria.attributes[key])));
    }
    if let Some(class) = &criteria.class_name {
        xpath.push_str(&format!(
            "[contains(concat(\" \", normalize-space(@class), \" \"), concat(\" \", {}, \" \"))]",
            xpath_literal(class)
        ));
    }
    if let Some(text) = &criteria.text {
        xpath.push_str(&format!("[normalize-space(.)={}]", xpath_literal(text)));
    }
    if relative {
        xpath = format!(".{xpath}");
    }
    (SearchMethod::XPath, xpath.clone(), Strategy::XPath(xpath))
}

/// Detect a `query()` expression's flavor. `#id`/`.class` shorthands are
/// already valid CSS selectors, so they fall through to the same `Css`
/// execution path as a plain selector.
fn classify_query_expression(expression: &str) -> Strategy {
    if expression.starts_with("//") || expression.starts_with("./") {
        Strategy::XPath(expression.to_string())
    } else {
        Strategy::Css(expression.to_string())
    }
}

/// Escape a value for use inside an XPath string literal, including the
/// surrounding quotes. XPath 1.0 has no in-literal escape, so a value
/// containing both quote kinds is built with `concat()`.
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{value}\"")
    } else if !value.contains('\'') {
        format!("'{value}'")
    } else {
        let parts: Vec<String> = value.split('"').map(|part| format!("\"{part}\"")).collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

fn css_escape_ident(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_css_attr_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Poll `strategy` at [`POLL_INTERVAL`] until a match appears or `timeout`
/// elapses, then materialize every matching node into a [`WebElement`].
#[allow(clippy::too_many_arguments)]
async fn poll_for_elements(
    connection: Arc<Connection>,
    root_object_id: Option<String>,
    strategy: Strategy,
    find_all: bool,
    timeout: Duration,
    raise_exc: bool,
    search_method: SearchMethod,
    selector: String,
) -> Result<Vec<WebElement>, CoreError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let object_ids = run_search(&connection, root_object_id.as_deref(), &strategy, find_all).await?;
        if !object_ids.is_empty() {
            let mut elements = Vec::with_capacity(object_ids.len());
            for object_id in object_ids {
                elements.push(materialize_element(&connection, object_id, search_method, selector.clone()).await?);
            }
            return Ok(elements);
        }

        if timeout.is_zero() || tokio::time::Instant::now() >= deadline {
            return if raise_exc {
                if timeout.is_zero() {
                    Err(CoreError::ElementNotFound)
                } else {
                    Err(CoreError::WaitElementTimeout(timeout))
                }
            } else {
                Ok(Vec::new())
            };
        }

        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        tokio::time::sleep(POLL_INTERVAL.min(remaining)).await;
    }
}

/// Run one search attempt, returning the remote object ids of every match
/// (zero or one for `find_all = false`).
async fn run_search(
    connection: &Arc<Connection>,
    root_object_id: Option<&str>,
    strategy: &Strategy,
    find_all: bool,
) -> Result<Vec<String>, CoreError> {
    let suffix = if find_all { "All" } else { "" };
    let top = match strategy {
        Strategy::Css(selector) => {
            let selector_json = serde_json::to_string(selector)?;
            match root_object_id {
                Some(object_id) => {
                    let body = format!("return this.querySelector{suffix}({selector_json});");
                    call_function(connection, object_id, &body).await?
                }
                None => {
                    let expression = format!("document.querySelector{suffix}({selector_json})");
                    evaluate(connection, &expression).await?
                }
            }
        }
        Strategy::XPath(expression_text) => {
            let expr_json = serde_json::to_string(expression_text)?;
            if find_all {
                match root_object_id {
                    Some(object_id) => {
                        let body = format!(
                            "var r = document.evaluate({expr_json}, this, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); var out = []; for (var i = 0; i < r.snapshotLength; i++) {{ out.push(r.snapshotItem(i)); }} return out;"
                        );
                        call_function(connection, object_id, &body).await?
                    }
                    None => {
                        let expression = format!(
                            "(function() {{ var r = document.evaluate({expr_json}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); var out = []; for (var i = 0; i < r.snapshotLength; i++) {{ out.push(r.snapshotItem(i)); }} return out; }})()"
                        );
                        evaluate(connection, &expression).await?
                    }
                }
            } else {
                match root_object_id {
                    Some(object_id) => {
                        let body = format!(
                            "return document.evaluate({expr_json}, this, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;"
                        );
                        call_function(connection, object_id, &body).await?
                    }
                    None => {
                        let expression = format!(
                            "document.evaluate({expr_json}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
                        );
                        evaluate(connection, &expression).await?
                    }
                }
            }
        }
    };

    let Some(object_id) = top.object_id else {
        return Ok(Vec::new());
    };

    if !find_all {
        return Ok(vec![object_id]);
    }

    let properties: devtool_cdp::protocol::runtime::GetPropertiesResult = connection
        .execute_command(
            "Runtime.getProperties",
            Some(devtool_cdp::protocol::runtime::GetPropertiesParams {
                object_id,
                own_properties: Some(true),
            }),
        )
        .await?;

    let mut indexed: Vec<(usize, String)> = properties
        .result
        .into_iter()
        .filter_map(|property| {
            let index: usize = property.name.parse().ok()?;
            let object_id = property.value?.object_id?;
            Some((index, object_id))
        })
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, object_id)| object_id).collect())
}

async fn evaluate(connection: &Arc<Connection>, expression: &str) -> Result<devtool_cdp::protocol::runtime::RemoteObject, CoreError> {
    let result: EvaluateResult = connection
        .execute_command(
            "Runtime.evaluate",
            Some(EvaluateParams {
                expression: expression.to_string(),
                return_by_value: Some(false),
                await_promise: None,
            }),
        )
        .await?;
    Ok(result.result)
}

async fn call_function(
    connection: &Arc<Connection>,
    object_id: &str,
    body: &str,
) -> Result<devtool_cdp::protocol::runtime::RemoteObject, CoreError> {
    let result: EvaluateResult = connection
        .execute_command(
            "Runtime.callFunctionOn",
            Some(CallFunctionOnParams {
                function_declaration: format!("function() {{ {body} }}"),
                object_id: Some(object_id.to_string()),
                arguments: None,
                return_by_value: Some(false),
            }),
        )
        .await?;
    Ok(result.result)
}

/// Resolve a `Runtime` object id into a CDP node, its flat attribute list,
/// and its tag name, then build the resulting [`WebElement`].
async fn materialize_element(
    connection: &Arc<Connection>,
    object_id: String,
    search_method: SearchMethod,
    selector: String,
) -> Result<WebElement, CoreError> {
    let node: RequestNodeResult = connection
        .execute_command(
            "DOM.requestNode",
            Some(RequestNodeParams {
                object_id: object_id.clone(),
            }),
        )
        .await?;

    let attributes: GetAttributesResult = connection
        .execute_command("DOM.getAttributes", Some(GetAttributesParams { node_id: node.node_id }))
        .await?;

    let description: DescribeNodeResult = connection
        .execute_command(
            "DOM.describeNode",
            Some(DescribeNodeParams {
                object_id: Some(object_id.clone()),
                node_id: None,
            }),
        )
        .await?;

    Ok(WebElement::new(
        object_id,
        connection.clone(),
        search_method,
        selector,
        attributes.into_map(),
        description.node.node_name.to_lowercase(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_id_criteria_uses_native_css_strategy() {
        let criteria = FindCriteria::new().id("search-box");
        let (method, selector, strategy) = build_strategy(&criteria, false);
        assert_eq!(method, SearchMethod::Id);
        assert_eq!(selector, "#search-box");
        assert!(matches!(strategy, Strategy::Css(s) if s == "#search-box"));
    }

    #[test]
    fn combined_criteria_builds_xpath() {
        let criteria = FindCriteria::new().tag_name("button").class_name("primary");
        let (method, _, strategy) = build_strategy(&criteria, false);
        assert_eq!(method, SearchMethod::XPath);
        let Strategy::XPath(expr) = strategy else {
            panic!("expected xpath strategy");
        };
        assert!(expr.starts_with("//button"));
        assert!(expr.contains("contains(concat"));
    }

    #[test]
    fn class_name_with_quote_is_escaped_via_xpath_literal() {
        let criteria = FindCriteria::new().tag_name("div").class_name("foo\"bar");
        let (_, _, strategy) = build_strategy(&criteria, false);
        let Strategy::XPath(expr) = strategy else {
            panic!("expected xpath strategy");
        };
        assert!(!expr.contains("\" foo\"bar \""), "quote must not be spliced in raw: {expr}");
        assert!(expr.contains("concat(\" \", 'foo\"bar', \" \")"));
    }

    #[test]
    fn relative_xpath_is_prefixed_with_dot() {
        let criteria = FindCriteria::new().tag_name("span").text("ok");
        let (_, _, strategy) = build_strategy(&criteria, true);
        let Strategy::XPath(expr) = strategy else {
            panic!("expected xpath strategy");
        };
        assert!(expr.starts_with(".//span"));
    }

    #[test]
    fn query_expression_flavors_are_classified() {
        assert!(matches!(classify_query_expression("//div"), Strategy::XPath(_)));
        assert!(matches!(classify_query_expression("./div"), Strategy::XPath(_)));
        assert!(matches!(classify_query_expression("#id"), Strategy::Css(_)));
        assert!(matches!(classify_query_expression(".class"), Strategy::Css(_)));
        assert!(matches!(classify_query_expression("div.row"), Strategy::Css(_)));
    }
}

#![allow(dead_code)]

use dom::{Document, Node, NodeId};
use forms::{FormsConfig, FormsController, Page, PatternMask};
use platform::Storage;
use url::Url;

pub const HOME: &str = "https://landing.test/index.html";
pub const ORDER_URL: &str = "https://landing.test/index.html?concert-city=Kyiv&concert-venue=Arena&concert-datetime=2024-05-01T19:00&ticket-count=2#tickets";

pub fn elem(tag: &str) -> Node {
    Node::element(tag)
}

pub fn input(ty: &str, name: &str) -> Node {
    elem("input").attr("type", ty).attr("name", name)
}

pub fn errors() -> Node {
    elem("span").flag("data-js-form-field-errors")
}

/// `label > (control, errors container)`
pub fn labelled(control: Node) -> Node {
    elem("label").children([control, errors()])
}

fn order_form() -> Node {
    elem("form")
        .attr("name", "order")
        .id("order__form")
        .flag("data-js-form")
        .children([
            input("hidden", "concert-city").id("concert-city").attr("value", "Kyiv"),
            input("hidden", "concert-venue").id("concert-venue").attr("value", "Arena"),
            input("hidden", "concert-datetime")
                .id("concert-datetime")
                .attr("value", "2024-05-01T19:00"),
            labelled(input("text", "name").flag("required").attr("minlength", "2")),
            labelled(
                input("tel", "phone")
                    .flag("required")
                    .flag("data-js-phone")
                    .attr("pattern", r"\+38 \(\d{3}\) \d{3}-\d{2}-\d{2}")
                    .attr("title", "Формат: +38 (0XX) XXX-XX-XX"),
            ),
            labelled(
                input("number", "ticket-count")
                    .flag("required")
                    .attr("min", "1")
                    .attr("max", "10"),
            ),
            labelled(
                input("checkbox", "policy")
                    .class("js-policy-checkbox")
                    .flag("required")
                    .flag("checked"),
            ),
            elem("button").attr("type", "submit").flag("data-js-submit"),
        ])
}

fn contacts_form() -> Node {
    elem("form")
        .id("contacts-form")
        .flag("data-js-form")
        .children([
            labelled(input("text", "name").flag("required")),
            labelled(input("email", "e-mail").flag("required")),
            elem("label").child(elem("textarea").attr("name", "message")),
            elem("fieldset").children([
                input("radio", "reply").attr("value", "email").flag("checked"),
                input("radio", "reply").attr("value", "phone"),
            ]),
            elem("label").child(input("checkbox", "policy").class("js-policy-checkbox")),
            elem("button").attr("type", "submit").flag("data-js-submit"),
        ])
}

fn search_form() -> Node {
    elem("form")
        .id("search")
        .children([input("search", "q"), elem("button").attr("type", "submit")])
}

pub fn landing_page() -> Document {
    Document::load(Node::document(vec![elem("html").child(
        elem("body")
            .class("popup-open")
            .style("overflow", "hidden")
            .children([
                elem("header").child(search_form()),
                elem("div")
                    .class("popup is-visible")
                    .attr("aria-hidden", "false")
                    .child(order_form()),
                elem("div").class("popup-overlay is-visible"),
                elem("section").id("contacts").child(contacts_form()),
            ]),
    )]))
}

pub fn open_with(storage: Box<dyn Storage>, url: &str, config: FormsConfig) -> Page {
    let controller = FormsController::new(config).unwrap();
    let mut page = Page::new(landing_page(), Url::parse(url).unwrap(), storage, controller)
        .with_input_mask(PatternMask::ukrainian_phone());
    page.load();
    page
}

pub fn open(storage: &platform::MemoryStorage, url: &str) -> Page {
    open_with(Box::new(storage.clone()), url, FormsConfig::default())
}

pub fn by_id(page: &Page, id: &str) -> NodeId {
    page.element_by_id(id)
        .unwrap_or_else(|| panic!("no element #{id}"))
}

pub fn field(page: &Page, form_id: &str, name: &str) -> NodeId {
    let form = by_id(page, form_id);
    page.document()
        .named_element(form, name)
        .unwrap_or_else(|| panic!("no field `{name}` in #{form_id}"))
}

/// The control of `form_id` named `name` whose value is `value`.
pub fn choice(page: &Page, form_id: &str, name: &str, value: &str) -> NodeId {
    let form = by_id(page, form_id);
    let doc = page.document();
    doc.form_elements(form)
        .into_iter()
        .find(|&n| doc.attr(n, "name") == Some(name) && doc.attr(n, "value") == Some(value))
        .unwrap_or_else(|| panic!("no `{name}={value}` in #{form_id}"))
}

pub fn submit_button(page: &Page, form_id: &str) -> NodeId {
    let form = by_id(page, form_id);
    let doc = page.document();
    doc.form_elements(form)
        .into_iter()
        .find(|&n| doc.tag(n) == Some("button"))
        .unwrap_or_else(|| panic!("no button in #{form_id}"))
}

/// Text of every `span.form-error` in the container bound to `field`.
pub fn rendered_errors(page: &Page, field: NodeId) -> Vec<String> {
    let doc = page.document();
    let Some(target) = doc
        .attr(field, "aria-errormessage")
        .and_then(|id| doc.get_element_by_id(id))
    else {
        return Vec::new();
    };
    doc.children(target)
        .iter()
        .filter(|&&c| doc.has_class(c, "form-error"))
        .map(|&c| doc.text_content(c))
        .collect()
}

//! Markup of the concert landing page the binary drives.

use dom::{Document, Node};

fn el(tag: &str) -> Node {
    Node::element(tag)
}

fn input(ty: &str, name: &str) -> Node {
    el("input").attr("type", ty).attr("name", name)
}

fn field(caption: &str, control: Node) -> Node {
    el("label").class("form__field").children([
        el("span").class("form__caption").child(Node::text(caption)),
        control,
        el("span").class("form__errors").flag("data-js-form-field-errors"),
    ])
}

fn policy() -> Node {
    el("label").class("form__policy").children([
        input("checkbox", "policy").class("js-policy-checkbox").flag("required"),
        Node::text("Погоджуюсь з політикою конфіденційності"),
        el("span").class("form__errors").flag("data-js-form-field-errors"),
    ])
}

fn order_popup() -> Node {
    let form = el("form")
        .attr("name", "order")
        .id("order__form")
        .attr("data-js-form-role", "order")
        .flag("data-js-form")
        .children([
            input("hidden", "concert-city").id("concert-city").attr("value", "Київ"),
            input("hidden", "concert-venue").id("concert-venue").attr("value", "Палац Спорту"),
            input("hidden", "concert-datetime")
                .id("concert-datetime")
                .attr("value", "2025-06-14T19:00"),
            field("Ім'я", input("text", "name").flag("required").attr("minlength", "2")),
            field(
                "Телефон",
                input("tel", "phone")
                    .flag("required")
                    .flag("data-js-phone")
                    .attr("pattern", r"\+38 \(\d{3}\) \d{3}-\d{2}-\d{2}")
                    .attr("title", "Формат: +38 (0XX) XXX-XX-XX"),
            ),
            field(
                "Кількість квитків",
                input("number", "ticket-count")
                    .flag("required")
                    .attr("min", "1")
                    .attr("max", "10"),
            ),
            policy(),
            el("button")
                .attr("type", "submit")
                .flag("data-js-submit")
                .child(Node::text("Замовити")),
        ]);
    el("div")
        .class("popup")
        .attr("aria-hidden", "true")
        .child(el("div").class("popup__body").child(form))
}

fn contacts() -> Node {
    let form = el("form")
        .attr("name", "contacts")
        .flag("data-js-form")
        .children([
            field("Ім'я", input("text", "name").flag("required")),
            field("E-mail", input("email", "e-mail").flag("required")),
            field("Повідомлення", el("textarea").attr("name", "message").attr("maxlength", "500")),
            policy(),
            el("button")
                .attr("type", "submit")
                .flag("data-js-submit")
                .child(Node::text("Надіслати")),
        ]);
    el("section")
        .id("contacts")
        .children([el("h2").child(Node::text("Контакти")), form])
}

pub fn landing_page() -> Document {
    Document::load(Node::document(vec![el("html").children([
        el("head").child(el("title").child(Node::text("Концерт"))),
        el("body").children([
            el("main").children([
                el("section")
                    .id("tickets")
                    .child(el("h1").child(Node::text("Квитки"))),
                contacts(),
            ]),
            order_popup(),
            el("div").class("popup-overlay"),
        ]),
    ])]))
}

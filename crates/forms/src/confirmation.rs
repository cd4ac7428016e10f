//! Order confirmation driven by navigation query parameters.

use crate::config::ConfirmationConfig;
use crate::notify;
use crate::page::Page;
use url::Url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub city: String,
    pub venue: String,
    pub datetime: String,
    pub tickets: String,
}

impl OrderConfirmation {
    /// All four parameters present and non-empty; the first occurrence of a
    /// repeated parameter wins.
    pub fn from_url(url: &Url, cfg: &ConfirmationConfig) -> Option<Self> {
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
        };
        Some(Self {
            city: param(&cfg.city)?,
            venue: param(&cfg.venue)?,
            datetime: param(&cfg.datetime)?,
            tickets: param(&cfg.tickets)?,
        })
    }

    pub fn lines(&self, cfg: &ConfirmationConfig) -> Vec<String> {
        vec![
            cfg.heading.clone(),
            format!("{}: {}", cfg.city_label, self.city),
            format!("{}: {}", cfg.venue_label, self.venue),
            format!("{}: {}", cfg.datetime_label, self.datetime),
            format!("{}: {}", cfg.tickets_label, self.tickets),
        ]
    }
}

/// Shows the confirmation once per guard cycle and strips the query from the
/// current history entry. Returns whether a notification was shown.
pub fn check(page: &mut Page) -> bool {
    let cfg = page.controller.config().confirmation.clone();
    let Some(order) = OrderConfirmation::from_url(page.location(), &cfg) else {
        return false;
    };
    if !page.controller.claim_order_alert() {
        log::debug!(target: "forms.confirm", "confirmation already shown");
        return false;
    }

    let doc = page.document();
    let anchor = doc
        .query_selector(doc.root(), &page.controller.selectors().order_anchor)
        .unwrap_or(doc.body());
    if let Err(err) = notify::show(page, anchor, order.lines(&cfg)) {
        log::error!(target: "forms.confirm", "cannot show confirmation: {err}");
    }

    let mut clean = page.location().clone();
    clean.set_query(None);
    if let Err(err) = page.window.replace_state(clean.as_str()) {
        log::error!(target: "forms.confirm", "cannot scrub query: {err}");
    }
    log::info!(target: "forms.confirm", "order confirmed for {} ({} tickets)", order.city, order.tickets);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn requires_all_four_parameters() {
        let cfg = ConfirmationConfig::default();
        let full = url(
            "https://site.test/index.html?concert-city=Kyiv&concert-venue=Arena&concert-datetime=2024-05-01T19:00&ticket-count=2",
        );
        let order = OrderConfirmation::from_url(&full, &cfg).unwrap();
        assert_eq!(order.city, "Kyiv");
        assert_eq!(order.tickets, "2");

        let missing = url("https://site.test/?concert-city=Kyiv&concert-venue=Arena&concert-datetime=x");
        assert_eq!(OrderConfirmation::from_url(&missing, &cfg), None);
        let empty = url("https://site.test/?concert-city=&concert-venue=Arena&concert-datetime=x&ticket-count=1");
        assert_eq!(OrderConfirmation::from_url(&empty, &cfg), None);
    }

    #[test]
    fn decodes_form_encoding() {
        let cfg = ConfirmationConfig::default();
        let u = url("https://site.test/?concert-city=Ivano-Frankivsk&concert-venue=Palace+of+Arts&concert-datetime=2024-05-01T19%3A00&ticket-count=3");
        let order = OrderConfirmation::from_url(&u, &cfg).unwrap();
        assert_eq!(order.venue, "Palace of Arts");
        assert_eq!(order.datetime, "2024-05-01T19:00");
        assert_eq!(
            order.lines(&cfg),
            vec![
                "✅ Ваше замовлення підтверджено".to_string(),
                "Місто: Ivano-Frankivsk".to_string(),
                "Місце: Palace of Arts".to_string(),
                "Дата і час: 2024-05-01T19:00".to_string(),
                "Кількість квитків: 3".to_string(),
            ]
        );
    }
}

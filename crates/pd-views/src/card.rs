//! Detail card for the edition under the map pointer

use pd_core::HostYear;
use pd_data::{DataError, EditionLookup, EditionRecord};

use crate::artifact::{DetailCard, EditionCard};

/// Turn a lookup result into card contents. `None` gives the not-found card.
pub fn card_from_record(key: &HostYear, record: Option<&EditionRecord>) -> DetailCard {
    let Some(record) = record else {
        return DetailCard::NotFound {
            host: key.host.clone(),
            year: key.year,
            message: "Event not found".to_string(),
        };
    };

    let lines = vec![
        count_line(record.participants, "athletes"),
        count_line(record.events, "events"),
        count_line(record.countries, "participating teams"),
        count_line(record.sports, "sports"),
    ];

    DetailCard::Edition(EditionCard {
        title: record.key().label(),
        host: record.host.clone(),
        year: record.year,
        logo: format!("logos/{}_{}.jpg", record.year, record.host),
        participants: record.participants,
        events: record.events,
        countries: record.countries,
        sports: record.sports,
        lines,
    })
}

/// Look up `key` and build its card. No match is a card, not an error.
pub fn build_detail_card<L>(lookup: &L, key: &HostYear) -> Result<DetailCard, DataError>
where
    L: EditionLookup + ?Sized,
{
    let record = lookup.edition_by_host_year(key)?;
    if record.is_none() {
        tracing::debug!("No edition matches '{}'", key);
    }
    Ok(card_from_record(key, record.as_ref()))
}

/// Same as [`build_detail_card`] for a `"{host} {year}"` map label
pub fn build_detail_card_from_label<L>(lookup: &L, label: &str) -> Result<DetailCard, DataError>
where
    L: EditionLookup + ?Sized,
{
    build_detail_card(lookup, &HostYear::parse_label(label)?)
}

/// Card for the current hover state; nothing hovered gives an empty card
pub fn build_hover_card<L>(lookup: &L, hover: Option<&HostYear>) -> Result<DetailCard, DataError>
where
    L: EditionLookup + ?Sized,
{
    match hover {
        Some(key) => build_detail_card(lookup, key),
        None => Ok(DetailCard::NoSelection),
    }
}

fn count_line(count: Option<i64>, noun: &str) -> String {
    match count {
        Some(n) => format!("{} {}", n, noun),
        None => format!("unknown {}", noun),
    }
}

//! Contact list presentation: filtering, sorting by name, pagination
//!
//! These are plain functions over owned values. The sort direction a client
//! is currently showing travels with each request rather than living in
//! shared state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::contact::Contact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Next direction when the name header is clicked.
    ///
    /// An unsorted list goes descending first, then alternates.
    pub fn toggle(current: Option<SortDirection>) -> SortDirection {
        match current {
            None | Some(SortDirection::Asc) => SortDirection::Desc,
            Some(SortDirection::Desc) => SortDirection::Asc,
        }
    }
}

/// Drop contacts that have no name or no country
pub fn displayable(contacts: Vec<Contact>) -> Vec<Contact> {
    contacts.into_iter().filter(Contact::is_displayable).collect()
}

fn compare_names(a: &Contact, b: &Contact) -> Ordering {
    let a = a.name.as_deref().unwrap_or_default();
    let b = b.name.as_deref().unwrap_or_default();
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

pub fn sort_by_name(contacts: &mut [Contact], direction: SortDirection) {
    contacts.sort_by(compare_names);
    if direction == SortDirection::Desc {
        contacts.reverse();
    }
}

/// One page of a longer list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-indexed page actually returned
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Slice out page `page` (1-indexed).
///
/// A list that fits on one page always comes back as page 1, and a page past
/// the end is clamped to the last page.
pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> Page<T> {
    let per_page = per_page.max(1);
    let total = items.len() as u64;
    let total_pages = total.div_ceil(per_page as u64).max(1) as u32;

    let page = if total <= per_page as u64 {
        1
    } else {
        page.clamp(1, total_pages)
    };

    let start = ((page - 1) as usize) * per_page as usize;
    let items = items
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();

    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::ContactToken;
    use pretty_assertions::assert_eq;

    fn contact(name: &str) -> Contact {
        Contact {
            token: ContactToken::new(format!("t-{}", name)),
            name: Some(name.to_string()),
            country: Some("USA".to_string()),
            ..Default::default()
        }
    }

    fn names(contacts: &[Contact]) -> Vec<&str> {
        contacts.iter().filter_map(|c| c.name.as_deref()).collect()
    }

    #[test]
    fn test_toggle_transitions() {
        assert_eq!(SortDirection::toggle(None), SortDirection::Desc);
        assert_eq!(SortDirection::toggle(Some(SortDirection::Desc)), SortDirection::Asc);
        assert_eq!(SortDirection::toggle(Some(SortDirection::Asc)), SortDirection::Desc);
    }

    #[test]
    fn test_sort_is_case_insensitive() {
        let mut contacts = vec![contact("bob"), contact("Alice"), contact("carol")];
        sort_by_name(&mut contacts, SortDirection::Asc);
        assert_eq!(names(&contacts), vec!["Alice", "bob", "carol"]);

        sort_by_name(&mut contacts, SortDirection::Desc);
        assert_eq!(names(&contacts), vec!["carol", "bob", "Alice"]);
    }

    #[test]
    fn test_displayable_drops_incomplete_contacts() {
        let mut nameless = contact("x");
        nameless.name = Some(" ".into());
        let mut stateless = contact("y");
        stateless.country = None;

        let kept = displayable(vec![contact("Ada"), nameless, stateless]);
        assert_eq!(names(&kept), vec!["Ada"]);
    }

    #[test]
    fn test_paginate_middle_and_last_page() {
        let items: Vec<u32> = (1..=25).collect();

        let second = paginate(items.clone(), 2, 10);
        assert_eq!(second.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(second.total_pages, 3);

        let last = paginate(items, 3, 10);
        assert_eq!(last.items, vec![21, 22, 23, 24, 25]);
    }

    #[test]
    fn test_paginate_clamps_out_of_range_pages() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(paginate(items.clone(), 9, 10).page, 3);
        assert_eq!(paginate(items, 0, 10).page, 1);
    }

    #[test]
    fn test_short_list_resets_to_first_page() {
        let page = paginate(vec!["only"], 4, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.items, vec!["only"]);

        let empty = paginate(Vec::<u32>::new(), 2, 10);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total, 0);
        assert_eq!(empty.total_pages, 1);
    }
}

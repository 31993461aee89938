use reqwest::Url;

use crate::models::TodoFilter;

const FILTER_PARAM: &str = "filter";

/// Initial filter from the page URL; anything unrecognized means `All`.
pub fn filter_from_url(url: &Url) -> TodoFilter {
    let value = url
        .query_pairs()
        .find(|(key, _)| key == FILTER_PARAM)
        .map(|(_, value)| value.into_owned());
    TodoFilter::from_param(value.as_deref())
}

/// The shareable URL for `filter`. `All` drops the parameter; other
/// parameters are kept.
pub fn url_with_filter(url: &Url, filter: TodoFilter) -> Url {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != FILTER_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if filter != TodoFilter::All {
        pairs.push((FILTER_PARAM.to_string(), filter.to_string()));
    }

    let mut next = url.clone();
    if pairs.is_empty() {
        next.set_query(None);
    } else {
        next.query_pairs_mut().clear().extend_pairs(pairs);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn reads_filter_param() {
        assert_eq!(filter_from_url(&url("http://x/")), TodoFilter::All);
        assert_eq!(filter_from_url(&url("http://x/?filter=active")), TodoFilter::Active);
        assert_eq!(
            filter_from_url(&url("http://x/?sort=due&filter=completed")),
            TodoFilter::Completed
        );
        assert_eq!(filter_from_url(&url("http://x/?filter=bogus")), TodoFilter::All);
    }

    #[test]
    fn writes_filter_param() {
        assert_eq!(
            url_with_filter(&url("http://x/"), TodoFilter::Active).as_str(),
            "http://x/?filter=active"
        );
        assert_eq!(
            url_with_filter(&url("http://x/?filter=active"), TodoFilter::Completed).as_str(),
            "http://x/?filter=completed"
        );
        assert_eq!(
            url_with_filter(&url("http://x/?filter=active"), TodoFilter::All).as_str(),
            "http://x/"
        );
        assert_eq!(
            url_with_filter(&url("http://x/notes?view=grid&filter=active"), TodoFilter::All)
                .as_str(),
            "http://x/notes?view=grid"
        );
    }
}

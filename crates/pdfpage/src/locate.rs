//! Text location in normalized page coordinates, and image placements.

use pdfpage_core::{PageError, Rect};
use tracing::trace;

use crate::page::PageHandle;

/// Find `query` on `page` and return each hit in the unit square.
///
/// Every hit rectangle is divided by the page's own width and height in
/// points. Order is preserved; coordinates are not clamped. An empty query
/// or a query with no hits yields an empty list.
///
/// # Errors
///
/// - [`PageError::InvalidParameter`] if the page reports a non-positive or
///   non-finite dimension.
/// - Any error returned by [`PageHandle::find_text`], unchanged.
pub fn find<P: PageHandle + ?Sized>(page: &P, query: &str) -> Result<Vec<Rect>, PageError> {
    find_by(page, query, |q| page.find_text(q))
}

/// Like [`find`], but hits in page points come from `search` instead of
/// [`PageHandle::find_text`]. Used for searches with non-default options.
///
/// `search` is not called for an empty query.
///
/// # Errors
///
/// As for [`find`], with errors from `search` passed through unchanged.
pub fn find_by<P, F>(page: &P, query: &str, search: F) -> Result<Vec<Rect>, PageError>
where
    P: PageHandle + ?Sized,
    F: FnOnce(&str) -> Result<Vec<Rect>, PageError>,
{
    let (width, height) = page.dimensions();
    if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
        return Err(PageError::invalid(format!(
            "page dimensions must be positive, got {width}x{height}"
        )));
    }
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let hits = search(query)?;
    trace!(page = page.index(), query, hits = hits.len(), "text search");
    Ok(hits.iter().map(|r| r.normalized(width, height)).collect())
}

/// The page's image placement rectangles in page-point space.
pub fn list_images<P: PageHandle + ?Sized>(page: &P) -> Vec<Rect> {
    page.image_mappings()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticPage;

    #[test]
    fn normalizes_by_page_size() {
        let page = SyntheticPage::new(612.0, 792.0)
            .with_text_hits("x", vec![Rect::new(36.0, 36.0, 72.0, 72.0)]);
        let hits = find(&page, "x").unwrap();
        assert_eq!(
            hits,
            vec![Rect {
                x1: 36.0 / 612.0,
                y1: 36.0 / 792.0,
                x2: 72.0 / 612.0,
                y2: 72.0 / 792.0,
            }]
        );
    }

    #[test]
    fn preserves_order_and_does_not_clamp() {
        let page = SyntheticPage::new(100.0, 100.0).with_text_hits(
            "q",
            vec![
                Rect::new(50.0, 50.0, 60.0, 60.0),
                Rect::new(90.0, 90.0, 120.0, 110.0),
                Rect::new(0.0, 0.0, 10.0, 10.0),
            ],
        );
        let hits = find(&page, "q").unwrap();
        assert_eq!(hits[0].x1, 0.5);
        assert_eq!(hits[1].x2, 1.2);
        assert_eq!(hits[2].x1, 0.0);
    }

    #[test]
    fn empty_query_and_no_hits() {
        let page = SyntheticPage::new(100.0, 100.0)
            .with_text_hits("", vec![Rect::new(0.0, 0.0, 1.0, 1.0)]);
        assert!(find(&page, "").unwrap().is_empty());
        assert!(find(&page, "missing").unwrap().is_empty());
    }

    #[test]
    fn errors_propagate() {
        let page = SyntheticPage::new(100.0, 100.0).failing_search("broken");
        assert_eq!(
            find(&page, "x"),
            Err(PageError::RenderFailure("broken".into()))
        );
    }

    #[test]
    fn degenerate_page_rejected() {
        let page = SyntheticPage::new(0.0, 100.0);
        assert!(matches!(find(&page, "x"), Err(PageError::InvalidParameter(_))));
    }

    #[test]
    fn custom_search_is_normalized_and_guarded() {
        let page = SyntheticPage::new(200.0, 100.0);
        let hits = find_by(&page, "x", |q| {
            assert_eq!(q, "x");
            Ok(vec![Rect::new(20.0, 10.0, 40.0, 50.0)])
        })
        .unwrap();
        assert_eq!(hits, vec![Rect::new(0.1, 0.1, 0.2, 0.5)]);

        assert!(find_by(&page, "", |_| panic!("empty query searched")).unwrap().is_empty());
        assert_eq!(
            find_by(&page, "(", |_| Err(PageError::invalid("bad pattern"))),
            Err(PageError::InvalidParameter("bad pattern".into()))
        );

        let flat = SyntheticPage::new(200.0, 0.0);
        assert!(matches!(
            find_by(&flat, "x", |_| Ok(Vec::new())),
            Err(PageError::InvalidParameter(_))
        ));
    }

    #[test]
    fn images_listed_as_is() {
        assert!(list_images(&SyntheticPage::new(10.0, 10.0)).is_empty());
        let page = SyntheticPage::new(10.0, 10.0)
            .with_image(Rect::new(1.0, 2.0, 3.0, 4.0))
            .with_image(Rect::new(5.0, 5.0, 6.0, 6.0));
        assert_eq!(
            list_images(&page),
            vec![Rect::new(1.0, 2.0, 3.0, 4.0), Rect::new(5.0, 5.0, 6.0, 6.0)]
        );
    }
}

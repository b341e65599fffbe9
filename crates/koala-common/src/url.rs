//! URL helpers for history traversal.
//!
//! [URL Standard](https://url.spec.whatwg.org/)
//! [§ 7.4.6.3 Updating the document](https://html.spec.whatwg.org/multipage/browsing-the-web.html#updating-the-document)
//!
//! Same-document traversals only care about one question: did the fragment
//! change? These helpers answer it on top of the `url` crate.

use ::url::Url;

/// [URL Standard § 4.1](https://url.spec.whatwg.org/#concept-url-fragment)
///
/// "A URL's fragment is either null or an ASCII string that can be used for
/// further processing on the resource the URL's other components identify."
///
/// Returns `true` if the fragments of `old` and `new` differ. A null fragment
/// and an empty fragment are different values.
#[must_use]
pub fn fragments_differ(old: &Url, new: &Url) -> bool {
    old.fragment() != new.fragment()
}

/// [URL Standard § 4.6](https://url.spec.whatwg.org/#concept-url-equals)
///
/// "A URL A equals another URL B, with an optional boolean exclude fragments
/// (default false), if ... the result of serializing A with exclude fragments
/// is identical to the result of serializing B with exclude fragments."
#[must_use]
pub fn equals_excluding_fragments(a: &Url, b: &Url) -> bool {
    let (mut a, mut b) = (a.clone(), b.clone());
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

/// [§ 7.4.6.4 Scrolling to a fragment](https://html.spec.whatwg.org/multipage/browsing-the-web.html#scroll-to-the-fragment-identifier)
///
/// Returns the fragment to scroll to, or `None` if the URL has no fragment
/// (an empty fragment means "scroll to the top of the document").
#[must_use]
pub fn indicated_fragment(url: &Url) -> Option<&str> {
    url.fragment()
}

//! Ready-made wait conditions.
//!
//! Each function returns a closure for [`Wait::until`](super::Wait::until)
//! on a [`Driver`]. Element lookups fail with `NoSuchElement` while the
//! element is absent, which the default wait ignores.

// ============================================================================
// Imports
// ============================================================================

use crate::driver::Driver;
use crate::error::Error;

use super::element::Element;
use super::selector::By;
use super::wait::ConditionFuture;

// ============================================================================
// Page Conditions
// ============================================================================

/// Page title equals `title`.
pub fn title_is(title: impl Into<String>) -> impl FnMut(Driver) -> ConditionFuture<bool> {
    let title = title.into();
    move |driver| {
        let title = title.clone();
        Box::pin(async move { Ok(driver.title().await? == title) })
    }
}

/// Page title contains `fragment`.
pub fn title_contains(fragment: impl Into<String>) -> impl FnMut(Driver) -> ConditionFuture<bool> {
    let fragment = fragment.into();
    move |driver| {
        let fragment = fragment.clone();
        Box::pin(async move { Ok(driver.title().await?.contains(&fragment)) })
    }
}

/// Current URL contains `fragment`.
pub fn url_contains(fragment: impl Into<String>) -> impl FnMut(Driver) -> ConditionFuture<bool> {
    let fragment = fragment.into();
    move |driver| {
        let fragment = fragment.clone();
        Box::pin(async move { Ok(driver.current_url().await?.contains(&fragment)) })
    }
}

/// Exactly `count` windows are open.
pub fn number_of_windows_to_be(count: usize) -> impl FnMut(Driver) -> ConditionFuture<bool> {
    move |driver| Box::pin(async move { Ok(driver.window_handles().await?.len() == count) })
}

// ============================================================================
// Element Conditions
// ============================================================================

/// An element matching `by` is in the DOM.
pub fn presence_of_element_located(by: By) -> impl FnMut(Driver) -> ConditionFuture<Element> {
    move |driver| {
        let by = by.clone();
        Box::pin(async move { driver.find_element(by).await })
    }
}

/// An element matching `by` is in the DOM and displayed.
///
/// An element that goes stale between lookup and check counts as not
/// visible yet.
pub fn visibility_of_element_located(
    by: By,
) -> impl FnMut(Driver) -> ConditionFuture<Option<Element>> {
    move |driver| {
        let by = by.clone();
        Box::pin(async move {
            let element = driver.find_element(by).await?;
            match element.is_displayed().await {
                Ok(true) => Ok(Some(element)),
                Ok(false) => Ok(None),
                Err(Error::StaleElementReference { .. }) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }
}

/// An element matching `by` is displayed and enabled.
pub fn element_to_be_clickable(by: By) -> impl FnMut(Driver) -> ConditionFuture<Option<Element>> {
    let mut visible = visibility_of_element_located(by);
    move |driver| {
        let lookup = visible(driver);
        Box::pin(async move {
            let Some(element) = lookup.await? else {
                return Ok(None);
            };
            match element.is_enabled().await {
                Ok(true) => Ok(Some(element)),
                Ok(false) => Ok(None),
                Err(Error::StaleElementReference { .. }) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }
}

/// `element` is no longer attached to the DOM.
pub fn staleness_of(element: Element) -> impl FnMut(Driver) -> ConditionFuture<bool> {
    move |_driver| {
        let element = element.clone();
        Box::pin(async move {
            match element.is_enabled().await {
                Ok(_) => Ok(false),
                Err(Error::StaleElementReference { .. }) => Ok(true),
                Err(e) => Err(e),
            }
        })
    }
}

//! Read models shared by the purchase queries.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::future::Future;

use serde::Serialize;

use crate::domain::foundation::{CourseId, LectureId, Money};
use crate::domain::purchase::PurchaseError;
use crate::ports::Course;

/// Course detail returned alongside the caller's purchase status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseDetail {
    pub id: CourseId,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub price: Money,
    pub lecture_ids: Vec<LectureId>,
}

impl From<Course> for CourseDetail {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            thumbnail_url: course.thumbnail_url,
            price: course.price,
            lecture_ids: course.lecture_ids,
        }
    }
}

/// Course fields shown in purchase listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub id: CourseId,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub price: Money,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            title: course.title.clone(),
            thumbnail_url: course.thumbnail_url.clone(),
            price: course.price.clone(),
        }
    }
}

/// Resolves each distinct key once, concurrently.
///
/// Keys that do not resolve are simply absent from the map.
pub(crate) async fn lookup_distinct<K, V, I, F, Fut>(
    keys: I,
    lookup: F,
) -> Result<HashMap<K, V>, PurchaseError>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<Option<V>, PurchaseError>>,
{
    let distinct: HashSet<K> = keys.into_iter().collect();
    let lookups = distinct.into_iter().map(|key| {
        let fut = lookup(key.clone());
        async move { fut.await.map(|found| found.map(|value| (key, value))) }
    });

    let resolved = futures::future::try_join_all(lookups).await?;
    Ok(resolved.into_iter().flatten().collect())
}

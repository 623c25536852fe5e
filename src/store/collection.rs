//! Collection names and per-collection update allow-lists.

use std::fmt;

/// Fields a recorded course exposes to `PUT /all-courses/{id}`.
const COURSE_FIELDS: &[&str] = &[
    "title",
    "url_id",
    "trainer",
    "description",
    "short_description",
    "trailer",
    "price",
    "discount",
    "status",
    "students",
    "reviews",
    "positive_ratings",
    "whatYoullLearn",
    "software",
    "courseFeatures",
    "course_type",
];

/// Live courses carry every course field plus scheduling and offer fields.
const LIVE_COURSE_FIELDS: &[&str] = &[
    "title",
    "url_id",
    "trainer",
    "description",
    "short_description",
    "trailer",
    "price",
    "discount",
    "status",
    "students",
    "reviews",
    "positive_ratings",
    "whatYoullLearn",
    "software",
    "courseFeatures",
    "course_type",
    "offer",
    "deadline",
];

const EBOOK_FIELDS: &[&str] = &[
    "title",
    "subtitle",
    "url",
    "description",
    "pdf",
    "preview",
    "price",
    "highlights",
    "contentDetails",
    "faq",
    "disclaimer",
];

const USER_FIELDS: &[&str] = &["displayName", "phone", "address", "photoURL"];

const ENROLLMENT_FIELDS: &[&str] = &["status"];

const RECORD_FIELDS: &[&str] = &["title", "url", "courseId", "description", "duration", "order"];

const BANNER_FIELDS: &[&str] = &[
    "title",
    "subtitle",
    "description",
    "image",
    "link",
    "buttonText",
    "status",
];

/// A named document collection.
///
/// The collection name doubles as the route prefix, so `Collection::Users`
/// is served under `/all-users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Courses,
    LiveCourses,
    Ebooks,
    Users,
    LiveEnrollments,
    LiveRecords,
    ClassRecords,
    Banners,
}

impl Collection {
    /// Every collection, in route registration order.
    pub const ALL: [Collection; 8] = [
        Collection::Courses,
        Collection::LiveCourses,
        Collection::Ebooks,
        Collection::Users,
        Collection::LiveEnrollments,
        Collection::LiveRecords,
        Collection::ClassRecords,
        Collection::Banners,
    ];

    /// Store-side collection name.
    pub const fn name(self) -> &'static str {
        match self {
            Collection::Courses => "all-courses",
            Collection::LiveCourses => "live-courses",
            Collection::Ebooks => "all-ebooks",
            Collection::Users => "all-users",
            Collection::LiveEnrollments => "live-enroll",
            Collection::LiveRecords => "live-records",
            Collection::ClassRecords => "class-records",
            Collection::Banners => "home-banner",
        }
    }

    /// Human-readable entity label used in response messages.
    pub const fn label(self) -> &'static str {
        match self {
            Collection::Courses | Collection::LiveCourses => "Course",
            Collection::Ebooks => "Ebook",
            Collection::Users => "User",
            Collection::LiveEnrollments => "Enrollment",
            Collection::LiveRecords | Collection::ClassRecords => "Record",
            Collection::Banners => "Banner",
        }
    }

    /// Fields a `PUT` is allowed to overwrite. Anything else in the
    /// request body is dropped.
    pub const fn updatable_fields(self) -> &'static [&'static str] {
        match self {
            Collection::Courses => COURSE_FIELDS,
            Collection::LiveCourses => LIVE_COURSE_FIELDS,
            Collection::Ebooks => EBOOK_FIELDS,
            Collection::Users => USER_FIELDS,
            Collection::LiveEnrollments => ENROLLMENT_FIELDS,
            Collection::LiveRecords | Collection::ClassRecords => RECORD_FIELDS,
            Collection::Banners => BANNER_FIELDS,
        }
    }

    /// Whether `DELETE /{name}/{id}` is exposed.
    pub const fn is_deletable(self) -> bool {
        matches!(self, Collection::LiveEnrollments)
    }

    /// Field that must be unique across the collection, if any.
    pub const fn unique_field(self) -> Option<&'static str> {
        match self {
            Collection::Users => Some("email"),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Embedded append-only sequences on a user document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentList {
    /// Recorded-course enrollments, stored under `Enrolled`.
    Recorded,
    /// Live-course enrollments, stored under `live_enroll`.
    Live,
}

impl EnrollmentList {
    /// Field name on the user document.
    pub const fn field(self) -> &'static str {
        match self {
            EnrollmentList::Recorded => "Enrolled",
            EnrollmentList::Live => "live_enroll",
        }
    }

    /// Route segment under `/all-users/{id}/`.
    pub const fn route_segment(self) -> &'static str {
        match self {
            EnrollmentList::Recorded => "enrolled",
            EnrollmentList::Live => "live_enroll",
        }
    }
}

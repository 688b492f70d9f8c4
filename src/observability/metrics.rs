//! Metric counters for the registration core.
//!
//! Recording goes through the `metrics` facade; nothing is exported unless the
//! embedding process installs a recorder.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    GeocodeRequests,
    GeocodeFailures,
    SearchesSuperseded,
    AddressesSuperseded,
    DeviceLocationFailures,
    SlotRejections,
    SubmissionsBuilt,
    SubmissionsSent,
    SubmissionsFailed,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::GeocodeRequests => "carwash_geocode_requests_total",
            MetricName::GeocodeFailures => "carwash_geocode_failures_total",
            MetricName::SearchesSuperseded => "carwash_searches_superseded_total",
            MetricName::AddressesSuperseded => "carwash_addresses_superseded_total",
            MetricName::DeviceLocationFailures => "carwash_device_location_failures_total",
            MetricName::SlotRejections => "carwash_slot_rejections_total",
            MetricName::SubmissionsBuilt => "carwash_submissions_built_total",
            MetricName::SubmissionsSent => "carwash_submissions_sent_total",
            MetricName::SubmissionsFailed => "carwash_submissions_failed_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod geocode {
    use super::MetricName;

    /// `kind` is `search` or `reverse`.
    pub fn request(kind: &'static str) {
        ::metrics::counter!(MetricName::GeocodeRequests.as_str(), "kind" => kind).increment(1);
    }

    pub fn failure(kind: &'static str) {
        ::metrics::counter!(MetricName::GeocodeFailures.as_str(), "kind" => kind).increment(1);
    }

    pub fn search_superseded() {
        ::metrics::counter!(MetricName::SearchesSuperseded.as_str()).increment(1);
    }

    pub fn address_superseded() {
        ::metrics::counter!(MetricName::AddressesSuperseded.as_str()).increment(1);
    }
}

pub mod device {
    use super::MetricName;

    pub fn failure(kind: &'static str) {
        ::metrics::counter!(MetricName::DeviceLocationFailures.as_str(), "kind" => kind)
            .increment(1);
    }
}

pub mod slots {
    use super::MetricName;

    pub fn rejected(reason: &'static str) {
        ::metrics::counter!(MetricName::SlotRejections.as_str(), "reason" => reason).increment(1);
    }
}

pub mod submission {
    use super::MetricName;

    pub fn built() {
        ::metrics::counter!(MetricName::SubmissionsBuilt.as_str()).increment(1);
    }

    pub fn sent() {
        ::metrics::counter!(MetricName::SubmissionsSent.as_str()).increment(1);
    }

    pub fn failed() {
        ::metrics::counter!(MetricName::SubmissionsFailed.as_str()).increment(1);
    }
}

use std::fmt;

use crate::models::{Tag, TripDetail, TripSummary};

/// Identity of a cached query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    TripList,
    TripDetail(String),
    Tags,
}

impl QueryKey {
    pub fn detail(id: impl Into<String>) -> Self {
        QueryKey::TripDetail(id.into())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::TripList => write!(f, "(\"list\")"),
            QueryKey::TripDetail(id) => write!(f, "(\"detail\", {:?})", id),
            QueryKey::Tags => write!(f, "(\"tags\")"),
        }
    }
}

/// A cached value. The variant always matches the variant of its key.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    TripList(Vec<TripSummary>),
    TripDetail(TripDetail),
    Tags(Vec<Tag>),
}

impl QueryData {
    pub fn into_trip_list(self) -> Option<Vec<TripSummary>> {
        match self {
            QueryData::TripList(list) => Some(list),
            _ => None,
        }
    }

    pub fn into_trip_detail(self) -> Option<TripDetail> {
        match self {
            QueryData::TripDetail(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn into_tags(self) -> Option<Vec<Tag>> {
        match self {
            QueryData::Tags(tags) => Some(tags),
            _ => None,
        }
    }

    pub fn as_trip_list_mut(&mut self) -> Option<&mut Vec<TripSummary>> {
        match self {
            QueryData::TripList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_trip_detail_mut(&mut self) -> Option<&mut TripDetail> {
        match self {
            QueryData::TripDetail(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_tags_mut(&mut self) -> Option<&mut Vec<Tag>> {
        match self {
            QueryData::Tags(tags) => Some(tags),
            _ => None,
        }
    }
}

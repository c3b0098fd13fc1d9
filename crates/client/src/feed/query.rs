//! Pagination and filter parameters for reading feeds.

/// Page selection shared by all feed reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub id_gt: Option<String>,
    pub id_gte: Option<String>,
    pub id_lt: Option<String>,
    pub id_lte: Option<String>,
    /// Ranking method; only meaningful for ranked flat feeds.
    pub ranking: Option<String>,
}

impl FeedQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Only activities newer than `id`.
    #[must_use]
    pub fn id_gt(mut self, id: impl Into<String>) -> Self {
        self.id_gt = Some(id.into());
        self
    }

    #[must_use]
    pub fn id_gte(mut self, id: impl Into<String>) -> Self {
        self.id_gte = Some(id.into());
        self
    }

    /// Only activities older than `id`.
    #[must_use]
    pub fn id_lt(mut self, id: impl Into<String>) -> Self {
        self.id_lt = Some(id.into());
        self
    }

    #[must_use]
    pub fn id_lte(mut self, id: impl Into<String>) -> Self {
        self.id_lte = Some(id.into());
        self
    }

    #[must_use]
    pub fn ranking(mut self, ranking: impl Into<String>) -> Self {
        self.ranking = Some(ranking.into());
        self
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset", offset.to_string()));
        }
        let cursors = [
            ("id_gt", &self.id_gt),
            ("id_gte", &self.id_gte),
            ("id_lt", &self.id_lt),
            ("id_lte", &self.id_lte),
            ("ranking", &self.ranking),
        ];
        for (key, value) in cursors {
            if let Some(value) = value {
                params.push((key, value.clone()));
            }
        }
        params
    }
}

/// Which notifications a read marks as seen or read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Everything returned by the read.
    All,
    /// Only the given ids.
    Ids(Vec<String>),
}

impl Marker {
    fn param_value(&self) -> String {
        match self {
            Self::All => "true".to_string(),
            Self::Ids(ids) => ids.join(","),
        }
    }
}

/// Notification feed read, optionally moving the seen/read cursors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationQuery {
    pub page: FeedQuery,
    pub mark_seen: Option<Marker>,
    pub mark_read: Option<Marker>,
}

impl NotificationQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page(mut self, page: FeedQuery) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn mark_seen(mut self, marker: Marker) -> Self {
        self.mark_seen = Some(marker);
        self
    }

    #[must_use]
    pub fn mark_read(mut self, marker: Marker) -> Self {
        self.mark_read = Some(marker);
        self
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = self.page.params();
        if let Some(marker) = &self.mark_seen {
            params.push(("mark_seen", marker.param_value()));
        }
        if let Some(marker) = &self.mark_read {
            params.push(("mark_read", marker.param_value()));
        }
        params
    }
}

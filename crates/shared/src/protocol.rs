use serde::{Deserialize, Serialize};

use crate::domain::{ClientStatus, PaymentStatus, SortColumn, SortDirection, ToggleField};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Query string of the list and export endpoints. Empty filters are left out
/// entirely; export requests carry no `page`/`limit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClientsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClientStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    pub sort: SortColumn,
    pub order: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub field: ToggleField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    pub total: u64,
    pub paid: u64,
    pub unpaid: u64,
    pub active: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today_new: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last7_new: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_overview_accepts_missing_optional_counters() {
        let stats: StatsOverview =
            serde_json::from_str(r#"{"total":10,"paid":4,"unpaid":6,"active":7}"#)
                .expect("decode");
        assert_eq!(stats.today_new, None);
        assert_eq!(stats.last7_new, None);

        let stats: StatsOverview = serde_json::from_str(
            r#"{"total":1,"paid":1,"unpaid":0,"active":1,"todayNew":1,"last7New":1}"#,
        )
        .expect("decode");
        assert_eq!(stats.today_new, Some(1));
        assert_eq!(stats.last7_new, Some(1));
    }

    #[test]
    fn list_params_omit_empty_filters() {
        let params = ListClientsParams {
            q: Some("ali".into()),
            page: Some(2),
            limit: Some(10),
            ..Default::default()
        };
        let json = serde_json::to_value(&params).expect("encode");
        assert_eq!(json["q"], "ali");
        assert_eq!(json["sort"], "createdAt");
        assert_eq!(json["order"], "desc");
        assert!(json.get("status").is_none());
        assert!(json.get("paymentStatus").is_none());
        assert!(json.get("course").is_none());
    }
}

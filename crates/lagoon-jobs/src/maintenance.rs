//! Index hygiene: bulk tag edits and asset-lifecycle sweeps.
//!
//! These are thin pass-throughs over the search and update endpoints,
//! kept out of the orchestration core; operators run them ad hoc.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use lagoon_api::{DataAsset, PlatformApi, SearchQuery, UpdateDataAssetRequest};
use serde_json::Value;

use crate::error::JobError;

/// A bulk tag edit: removals, then additions, then direct replacements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagUpdate {
    pub tags_to_remove: BTreeSet<String>,
    pub tags_to_add: BTreeSet<String>,
    pub tags_to_replace: BTreeMap<String, String>,
}

impl TagUpdate {
    /// The tag set `asset_tags` becomes after this edit. Tags not named
    /// by the edit are preserved; replacement runs last, so it also maps
    /// freshly added tags.
    pub fn apply(&self, asset_tags: &BTreeSet<String>) -> BTreeSet<String> {
        asset_tags
            .iter()
            .filter(|tag| !self.tags_to_remove.contains(*tag))
            .chain(self.tags_to_add.iter())
            .map(|tag| self.tags_to_replace.get(tag).unwrap_or(tag).clone())
            .collect()
    }
}

/// Maintenance operations over the data-asset index.
pub struct AssetMaintenance<A> {
    api: A,
    dry_run: bool,
}

impl<A: PlatformApi> AssetMaintenance<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            dry_run: false,
        }
    }

    /// Log the updates that would be issued instead of issuing them.
    pub fn dry_run(api: A) -> Self {
        Self { api, dry_run: true }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Apply `update` to every asset in `assets`.
    pub async fn update_tags(
        &self,
        update: &TagUpdate,
        assets: &[DataAsset],
    ) -> Result<(), JobError> {
        for asset in assets {
            let tags = update.apply(&asset.tags);
            // The update endpoint requires a name; resubmit the current one.
            let request = UpdateDataAssetRequest {
                name: asset.name.clone(),
                tags,
            };
            if self.dry_run {
                tracing::info!(asset_id = %asset.id, ?request, "dry run, skipping tag update");
                continue;
            }
            let response = self.api.update_data_asset(&asset.id, &request).await?;
            tracing::info!(asset_id = %asset.id, status = response.status, "updated tags");
        }
        Ok(())
    }

    /// Archived assets created before `keep_after` and not used since.
    pub async fn find_archived_assets_to_delete(
        &self,
        keep_after: DateTime<Utc>,
    ) -> Result<Vec<DataAsset>, JobError> {
        let assets = self.search(&SearchQuery::archived()).await?;
        let total = assets.len();
        let deletable: Vec<DataAsset> = assets
            .into_iter()
            .filter(|asset| {
                let created = DateTime::from_timestamp(asset.created, 0);
                let last_used = (asset.last_used != 0)
                    .then(|| DateTime::from_timestamp(asset.last_used, 0))
                    .flatten();
                let old = created.is_some_and(|created| created < keep_after);
                let not_used_recently =
                    last_used.is_none_or(|last_used| last_used < keep_after);
                old && not_used_recently
            })
            .collect();

        let (external_size, internal_size) =
            deletable
                .iter()
                .fold((0u64, 0u64), |(external, internal), asset| {
                    if asset.is_external() {
                        (external + asset.size, internal)
                    } else {
                        (external, internal + asset.size)
                    }
                });
        tracing::info!(
            deletable = deletable.len(),
            total,
            internal_size,
            external_size,
            "archived assets eligible for deletion"
        );
        Ok(deletable)
    }

    /// Dataset assets backed by an object-storage bucket.
    pub async fn find_external_assets(&self) -> Result<Vec<DataAsset>, JobError> {
        let assets = self.search(&SearchQuery::datasets()).await?;
        Ok(assets
            .into_iter()
            .filter(DataAsset::is_external)
            .collect())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<DataAsset>, JobError> {
        let response = self.api.search_data_assets(query).await?;
        if !response.is_success() {
            return Err(JobError::Search {
                status: response.status,
            });
        }
        let Some(Value::Array(items)) = response.body.get("results").cloned() else {
            return Err(JobError::Search {
                status: response.status,
            });
        };
        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<DataAsset>(item) {
                Ok(asset) => Some(asset),
                Err(error) => {
                    tracing::warn!(%error, "skipping unparseable search result");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn removals_run_before_additions_and_replacement_runs_last() {
        let update = TagUpdate {
            tags_to_remove: tags(&["stale"]),
            tags_to_add: tags(&["fresh"]),
            tags_to_replace: BTreeMap::from([("fresh".to_string(), "fresher".to_string())]),
        };
        let result = update.apply(&tags(&["stale", "ecephys"]));
        assert_eq!(result, tags(&["ecephys", "fresher"]));
    }

    #[test]
    fn untouched_tags_are_preserved() {
        let update = TagUpdate {
            tags_to_add: tags(&["new"]),
            ..TagUpdate::default()
        };
        assert_eq!(
            update.apply(&tags(&["a", "b"])),
            tags(&["a", "b", "new"])
        );
    }

    #[test]
    fn empty_update_is_identity() {
        let update = TagUpdate::default();
        let existing = tags(&["a", "b"]);
        assert_eq!(update.apply(&existing), existing);
    }
}

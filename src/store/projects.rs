// src/store/projects.rs
// Channel -> repository configuration mapping

use super::Database;
use crate::repo::RepositoryConfig;
use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Repositories investigated for one chat channel / project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channel_id: String,
    pub channel_name: String,
    pub project_name: String,
    pub repos: Vec<RepositoryConfig>,
}

impl Database {
    /// Insert or replace the repository configuration for a channel
    pub fn upsert_channel_config(&self, config: &ChannelConfig) -> Result<()> {
        let repos_json = serde_json::to_string(&config.repos)?;
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.conn().execute(
            "INSERT INTO channel_repos
               (channel_id, channel_name, project_name, repos, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(channel_id) DO UPDATE SET
               channel_name = excluded.channel_name,
               project_name = excluded.project_name,
               repos = excluded.repos,
               updated_at = excluded.updated_at",
            params![
                config.channel_id,
                config.channel_name,
                config.project_name,
                repos_json,
                now,
            ],
        )?;
        Ok(())
    }

    /// Repository configuration for one channel, if any
    pub fn get_channel_config(&self, channel_id: &str) -> Result<Option<ChannelConfig>> {
        let row = self
            .conn()
            .query_row(
                "SELECT channel_id, channel_name, project_name, repos
                 FROM channel_repos WHERE channel_id = ?1",
                params![channel_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((channel_id, channel_name, project_name, repos_json)) => {
                let repos = serde_json::from_str(&repos_json)?;
                Ok(Some(ChannelConfig {
                    channel_id,
                    channel_name,
                    project_name,
                    repos,
                }))
            }
            None => Ok(None),
        }
    }

    /// All channel configurations, ordered by project name
    pub fn list_channel_configs(&self) -> Result<Vec<ChannelConfig>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT channel_id, channel_name, project_name, repos
             FROM channel_repos ORDER BY project_name, channel_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut configs = Vec::new();
        for row in rows {
            let (channel_id, channel_name, project_name, repos_json) = row?;
            configs.push(ChannelConfig {
                channel_id,
                channel_name,
                project_name,
                repos: serde_json::from_str(&repos_json)?,
            });
        }
        Ok(configs)
    }

    /// Remove a channel's configuration
    pub fn delete_channel_config(&self, channel_id: &str) -> Result<bool> {
        let changed = self.conn().execute(
            "DELETE FROM channel_repos WHERE channel_id = ?1",
            params![channel_id],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::ProviderKind;

    fn sample_config(channel_id: &str) -> ChannelConfig {
        ChannelConfig {
            channel_id: channel_id.to_string(),
            channel_name: "#web-bugs".to_string(),
            project_name: "storefront".to_string(),
            repos: vec![RepositoryConfig {
                name: "web".to_string(),
                provider: ProviderKind::GitHub,
                url: "https://github.com/acme/storefront".to_string(),
                branch: "main".to_string(),
                credential_env: None,
                site_type: Some("wordpress".to_string()),
                tags: vec!["frontend".to_string()],
            }],
        }
    }

    #[test]
    fn test_upsert_and_get_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_channel_config(&sample_config("C1")).unwrap();

        let loaded = db.get_channel_config("C1").unwrap().unwrap();
        assert_eq!(loaded.project_name, "storefront");
        assert_eq!(loaded.repos.len(), 1);
        assert_eq!(loaded.repos[0].provider, ProviderKind::GitHub);
        assert_eq!(loaded.repos[0].site_type.as_deref(), Some("wordpress"));

        assert!(db.get_channel_config("C2").unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_channel_config(&sample_config("C1")).unwrap();

        let mut updated = sample_config("C1");
        updated.project_name = "storefront-v2".to_string();
        updated.repos.clear();
        db.upsert_channel_config(&updated).unwrap();

        let loaded = db.get_channel_config("C1").unwrap().unwrap();
        assert_eq!(loaded.project_name, "storefront-v2");
        assert!(loaded.repos.is_empty());
        assert_eq!(db.list_channel_configs().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_channel_config() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_channel_config(&sample_config("C1")).unwrap();
        assert!(db.delete_channel_config("C1").unwrap());
        assert!(!db.delete_channel_config("C1").unwrap());
    }
}

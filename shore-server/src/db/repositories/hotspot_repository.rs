use anyhow::Result;

use shore_types::DebrisHotspot;

use crate::db::DbPool;

pub struct HotspotRepository {
    pool: DbPool,
}

impl HotspotRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Every known hotspot; callers filter by distance in memory
    pub fn list_all(&self) -> Result<Vec<DebrisHotspot>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, location, debrisScore, lat, lon, description FROM debris_hotspots ORDER BY id",
        )?;

        let hotspots = stmt
            .query_map([], |row| {
                Ok(DebrisHotspot {
                    id: row.get(0)?,
                    location: row.get(1)?,
                    debris_score: row.get(2)?,
                    lat: row.get(3)?,
                    lon: row.get(4)?,
                    description: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(hotspots)
    }
}

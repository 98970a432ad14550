//! Three-tier pathfinder fallback (spec §4.3): reuse a radar-supplied path
//! if one ends near the target, else BFS, else A* with an iteration budget
//! clamped to `[80_000, 200_000]`.

use crate::error::RecoveryEvent;
use crate::world::{GridPos, PathSolverError, RadarPath, WorldApi};

const RADAR_REUSE_RADIUS: f32 = 20.0;
const ASTAR_MIN_ITERS: u32 = 80_000;
const ASTAR_MAX_ITERS: u32 = 200_000;

/// Which tier ultimately produced the route, surfaced for logging/tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    RadarReuse,
    Bfs,
    AStar,
}

/// Run the fallback chain against `world`, returning the chosen route and
/// which tier produced it, or `None` (with a [`RecoveryEvent`]) if every
/// tier failed.
pub fn solve(
    world: &dyn WorldApi,
    from: GridPos,
    to: GridPos,
    astar_iters_hint: u32,
) -> Result<(Vec<GridPos>, PathSource), RecoveryEvent> {
    if let Some(path) = reuse_radar_path(world.radar_paths(), to) {
        return Ok((path, PathSource::RadarReuse));
    }

    match world.find_path_bfs(from, to) {
        Ok(path) if !path.is_empty() => return Ok((path, PathSource::Bfs)),
        Ok(_) => {}
        Err(PathSolverError::SolverException) => {}
        Err(PathSolverError::NoPath) => {}
    }

    let iters = astar_iters_hint.clamp(ASTAR_MIN_ITERS, ASTAR_MAX_ITERS);
    match world.find_path(from, to, iters) {
        Ok(path) if !path.is_empty() => Ok((path, PathSource::AStar)),
        Ok(_) => Err(RecoveryEvent::NoPath { target: to }),
        Err(PathSolverError::NoPath) => Err(RecoveryEvent::NoPath { target: to }),
        Err(PathSolverError::SolverException) => Err(RecoveryEvent::PathSolverException),
    }
}

/// A radar-supplied path can be reused if its own endpoint lands within
/// `RADAR_REUSE_RADIUS` of the requested target.
fn reuse_radar_path(paths: Vec<RadarPath>, to: GridPos) -> Option<Vec<GridPos>> {
    paths
        .into_iter()
        .find(|p| p.path.last().map(|end| end.distance_to(to) <= RADAR_REUSE_RADIUS).unwrap_or(false))
        .map(|p| p.path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{AreaInfo, Entity, EntityFilter, MovementLock, Player};

    struct FakeWorld {
        radar: Vec<RadarPath>,
        bfs_result: Result<Vec<GridPos>, PathSolverError>,
        astar_result: Result<Vec<GridPos>, PathSolverError>,
    }

    impl WorldApi for FakeWorld {
        fn local_player(&self) -> Option<Player> {
            None
        }
        fn entities(&self, _filter: &EntityFilter) -> Vec<Entity> {
            Vec::new()
        }
        fn find_path(&self, _from: GridPos, _to: GridPos, _max_iters: u32) -> Result<Vec<GridPos>, PathSolverError> {
            self.astar_result.clone()
        }
        fn find_path_bfs(&self, _from: GridPos, _to: GridPos) -> Result<Vec<GridPos>, PathSolverError> {
            self.bfs_result.clone()
        }
        fn radar_paths(&self) -> Vec<RadarPath> {
            self.radar.clone()
        }
        fn tgt_locations(&self, _name_substring: &str) -> Vec<GridPos> {
            Vec::new()
        }
        fn area_info(&self) -> AreaInfo {
            AreaInfo::default()
        }
        fn area_change_count(&self) -> u64 {
            0
        }
        fn is_walkable(&self, _pos: GridPos) -> bool {
            true
        }
        fn movement_lock(&self) -> MovementLock {
            MovementLock::default()
        }
    }

    #[test]
    fn reuses_radar_path_when_endpoint_is_close() {
        let world = FakeWorld {
            radar: vec![RadarPath {
                name: "r".to_string(),
                target: GridPos::new(100.0, 100.0),
                path: vec![GridPos::new(0.0, 0.0), GridPos::new(95.0, 100.0)],
            }],
            bfs_result: Ok(vec![]),
            astar_result: Ok(vec![]),
        };
        let (path, source) = solve(&world, GridPos::new(0.0, 0.0), GridPos::new(100.0, 100.0), 100_000).unwrap();
        assert_eq!(source, PathSource::RadarReuse);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn falls_through_to_bfs_when_no_radar_match() {
        let world = FakeWorld {
            radar: vec![],
            bfs_result: Ok(vec![GridPos::new(1.0, 1.0)]),
            astar_result: Ok(vec![]),
        };
        let (_, source) = solve(&world, GridPos::new(0.0, 0.0), GridPos::new(100.0, 100.0), 100_000).unwrap();
        assert_eq!(source, PathSource::Bfs);
    }

    #[test]
    fn falls_through_to_astar_when_bfs_fails() {
        let world = FakeWorld {
            radar: vec![],
            bfs_result: Err(PathSolverError::NoPath),
            astar_result: Ok(vec![GridPos::new(2.0, 2.0)]),
        };
        let (_, source) = solve(&world, GridPos::new(0.0, 0.0), GridPos::new(100.0, 100.0), 300_000).unwrap();
        assert_eq!(source, PathSource::AStar);
    }

    #[test]
    fn astar_iteration_budget_is_clamped() {
        assert_eq!(10_000u32.clamp(ASTAR_MIN_ITERS, ASTAR_MAX_ITERS), ASTAR_MIN_ITERS);
        assert_eq!(500_000u32.clamp(ASTAR_MIN_ITERS, ASTAR_MAX_ITERS), ASTAR_MAX_ITERS);
    }

    #[test]
    fn no_path_when_every_tier_fails() {
        let world = FakeWorld {
            radar: vec![],
            bfs_result: Err(PathSolverError::NoPath),
            astar_result: Err(PathSolverError::NoPath),
        };
        let result = solve(&world, GridPos::new(0.0, 0.0), GridPos::new(100.0, 100.0), 100_000);
        assert!(matches!(result, Err(RecoveryEvent::NoPath { .. })));
    }
}

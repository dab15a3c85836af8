// ─── SaveNexus Core ───
// Backend for the local agent that feeds the SaveHub web dashboard.
//
// Architecture:
//   core/
//     sfo/      : PARAM.SFO decoder (header, index table, typed values)
//     library/  : SAVEDATA scan, disc ids, save states, snapshot index
//     game_map/ : Disc id → ISO path mapping
//     state/    : User settings store + shared handler state
//     launch/   : PPSSPP process spawner
//     paths     : Service configuration and default locations
//     persist   : JSON file helpers

pub mod error;
pub mod game_map;
pub mod launch;
pub mod library;
pub mod paths;
pub mod persist;
pub mod sfo;
pub mod state;

#[cfg(feature = "cli")]
pub mod cli;
pub mod animation;
pub mod config;
pub mod highlight;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod model;
pub mod render;
pub mod session;
pub mod stats;
pub mod theme;
pub mod timer;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use ir::{ColorTag, NodeClicked, NodeId, StatsSnapshot, TreeData, TreeNode};
pub use model::{IndexedTree, MalformedTree, ValidationError, validate};
pub use render::{DrawOutcome, Renderer, render_svg};
pub use session::{Session, TreeSource};

/// One-shot render of `data` with no interaction state.
pub fn render_tree_svg(data: &TreeData, config: &Config) -> String {
    let mut session = Session::new(config.clone());
    session.draw(data);
    session.svg()
}

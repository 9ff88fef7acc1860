// Facebatch Infrastructure - System Adapters
// Implements: ResourceMonitor, SystemAction, TransformEngine, MediaToolkit, config loading

pub mod adapters;
pub mod command;
pub mod command_action;
pub mod command_engine;
pub mod config_loader;
pub mod ffmpeg_media;
pub mod resource_monitor_impl;

pub use adapters::Adapters;
pub use command_action::CommandSystemAction;
pub use command_engine::CommandTransformEngine;
pub use config_loader::ConfigLoader;
pub use ffmpeg_media::FfmpegMediaToolkit;
pub use resource_monitor_impl::SysinfoResourceMonitor;

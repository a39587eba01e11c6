//! An ambient particle network. Small points drift around a drawing surface, faint lines join
//! the ones that are near each other, and the pointer both pushes particles away and links to
//! the ones around it.

pub mod animation;
pub mod blender;
pub mod canvas;
pub mod cli_args;
pub mod config;
pub mod field;
pub mod frame_loop;
pub mod particle;
pub mod pointer;
pub mod raw_input;
pub mod renderer;
pub mod run;
pub mod surface;

// Arena-based storage for render registrations
//
// The render arena is global static storage behind a RwLock. RenderId is a
// lightweight newtype indexing into the slab; the public RenderHandle owns one
// id and frees the slot on drop.

pub mod render_arena;

pub use render_arena::{
    RenderId, RenderSlot, current_render, mark_render_pending, render_arena_insert,
    render_arena_remove, take_pending_renders,
};

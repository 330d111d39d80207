mod helpers;
mod inventory;
mod recipe;
mod scan;
mod suggest;

pub(crate) use inventory::{
    cmd_inventory_add, cmd_inventory_add_random, cmd_inventory_delete, cmd_inventory_list,
    cmd_inventory_remove_random, cmd_inventory_update,
};
pub(crate) use recipe::{cmd_recipe_list, cmd_recipe_show};
pub(crate) use scan::cmd_scan;
pub(crate) use suggest::cmd_suggest;

//! Tree search and forward iteration (C4).
//!
//! A cursor names a `(page_num, cell_num)` position that, once search has
//! completed, always points at a leaf. These are free functions over a
//! `Pager` rather than methods on a borrowed `Table`, so the mutator (which
//! needs to interleave cursor positioning with page mutation) never has to
//! fight two live mutable borrows of the same table.

use crate::errors::Error;

use super::node::{self, NodeType};
use super::pager::Pager;

#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub page_num: u32,
    pub cell_num: usize,
    pub end_of_table: bool,
}

/// Recursive descent from the root to the leaf that should contain `key`.
pub fn table_find(pager: &mut Pager, root_page_num: u32, key: u32) -> Result<Cursor, Error> {
    let mut page_num = root_page_num;
    loop {
        let page = pager.get_page(page_num)?;
        match node::node_type(page) {
            NodeType::Leaf => {
                let cell_num = node::leaf_find_index(page, key);
                let num_cells = node::leaf_num_cells(page) as usize;
                let next_leaf = node::leaf_next_leaf(page);
                let end_of_table = cell_num == num_cells && next_leaf == 0;
                return Ok(Cursor {
                    page_num,
                    cell_num,
                    end_of_table,
                });
            }
            NodeType::Internal => {
                let i = node::internal_find_child_index(page, key);
                page_num = node::internal_child_at(page, i);
            }
        }
    }
}

/// Descends leftmost to the first leaf, positioned at cell 0.
pub fn table_start(pager: &mut Pager, root_page_num: u32) -> Result<Cursor, Error> {
    let mut page_num = root_page_num;
    loop {
        let page = pager.get_page(page_num)?;
        match node::node_type(page) {
            NodeType::Leaf => {
                let num_cells = node::leaf_num_cells(page) as usize;
                return Ok(Cursor {
                    page_num,
                    cell_num: 0,
                    end_of_table: num_cells == 0,
                });
            }
            NodeType::Internal => {
                page_num = node::internal_child_at(page, 0);
            }
        }
    }
}

/// Moves the cursor to the next cell, following `next_leaf` at a leaf's end.
pub fn advance(pager: &mut Pager, cursor: &mut Cursor) -> Result<(), Error> {
    let page = pager.get_page(cursor.page_num)?;
    let num_cells = node::leaf_num_cells(page) as usize;
    cursor.cell_num += 1;
    if cursor.cell_num >= num_cells {
        let next_leaf = node::leaf_next_leaf(page);
        if next_leaf == 0 {
            cursor.end_of_table = true;
        } else {
            cursor.page_num = next_leaf;
            cursor.cell_num = 0;
        }
    }
    Ok(())
}

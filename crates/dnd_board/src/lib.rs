mod board;
mod writer;

pub use board::{
    DndBoard, DndBoardEntry, DndBoardRow, DndBoardRowState, DndBoardState, build_rows, dnd_board,
};

//! Kanban facet: column placement across a board, card stacking inside a
//! column, incremental reflow after card changes, and scroll configuration.
//!
//! Columns are spaced 16 px apart (and from the board edges); cards get 8 px
//! of padding and inter-card spacing inside their column.

use serde::{Deserialize, Serialize};

use crate::layout::{
    LayoutEngine,
    errors::LayoutError,
    geometry::{Dimensions, Rectangle},
};

/// Gap between columns and from the board edges.
pub const COLUMN_SPACING: f64 = 16.0;
/// Left/right/top padding and inter-card gap inside a column.
pub const CARD_SPACING: f64 = 8.0;

/// A card to be placed: its task id and desired size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCard {
    pub id: String,
    pub size: Dimensions,
}

/// A placed card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCardPosition {
    pub task_id: String,
    pub bounds: Rectangle,
}

/// One column with its placed cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub bounds: Rectangle,
    pub cards: Vec<TaskCardPosition>,
}

/// The whole board: columns left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub columns: Vec<Column>,
    pub total_width: f64,
    pub spacing: f64,
}

impl ColumnLayout {
    /// Find a column by id.
    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    fn column_mut(&mut self, id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == id)
    }
}

/// Card mutations applied by [`LayoutEngine::handle_card_reflow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CardChange {
    Add {
        column_id: String,
        card: TaskCard,
        /// Insertion index; append when absent or out of range.
        position: Option<usize>,
    },
    Remove {
        column_id: String,
        task_id: String,
    },
    Move {
        task_id: String,
        from_column: String,
        to_column: String,
        position: Option<usize>,
    },
    Resize {
        column_id: String,
        task_id: String,
        size: Dimensions,
    },
}

/// Scrolling behavior for a board inside a viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    pub vertical: bool,
    pub horizontal: bool,
    pub speed: f64,
    pub viewport_bounds: Rectangle,
}

fn build_columns(board: Dimensions, count: usize) -> Result<ColumnLayout, LayoutError> {
    if count == 0 {
        return Err(LayoutError::invalid_input(
            "column-layout",
            "column count must be positive",
        ));
    }
    if !board.is_valid() {
        return Err(LayoutError::invalid_input(
            "column-layout",
            "board dimensions must be finite and non-negative",
        ));
    }

    let width = (board.width - COLUMN_SPACING * (count as f64 + 1.0)) / count as f64;
    let height = board.height - 2.0 * COLUMN_SPACING;
    if width <= 0.0 || height <= 0.0 {
        return Err(LayoutError::invalid_input(
            "column-layout",
            format!("board {}x{} too small for {count} columns", board.width, board.height),
        ));
    }

    let columns = (0..count)
        .map(|i| Column {
            id: format!("column-{i}"),
            bounds: Rectangle::new(
                COLUMN_SPACING + i as f64 * (width + COLUMN_SPACING),
                COLUMN_SPACING,
                width,
                height,
            ),
            cards: Vec::new(),
        })
        .collect();

    Ok(ColumnLayout {
        columns,
        total_width: board.width,
        spacing: COLUMN_SPACING,
    })
}

fn stack_cards(
    cards: &[TaskCard],
    column_bounds: &Rectangle,
) -> Result<Vec<TaskCardPosition>, LayoutError> {
    for card in cards {
        if !card.size.is_valid() {
            return Err(LayoutError::invalid_input(
                "arrange-cards",
                format!("card `{}` has invalid dimensions", card.id),
            ));
        }
    }

    let available_width = (column_bounds.size.width - 2.0 * CARD_SPACING).max(0.0);
    let x = column_bounds.origin.x + CARD_SPACING;
    let mut y = column_bounds.origin.y + CARD_SPACING;

    let mut placed = Vec::with_capacity(cards.len());
    for card in cards {
        let bounds = Rectangle::new(x, y, card.size.width.min(available_width), card.size.height);
        y = bounds.bottom() + CARD_SPACING;
        placed.push(TaskCardPosition {
            task_id: card.id.clone(),
            bounds,
        });
    }
    Ok(placed)
}

fn take_card(column: &mut Column, task_id: &str) -> Option<TaskCardPosition> {
    let at = column.cards.iter().position(|c| c.task_id == task_id)?;
    Some(column.cards.remove(at))
}

fn insert_card(column: &mut Column, card: TaskCardPosition, position: Option<usize>) {
    let at = position.unwrap_or(column.cards.len()).min(column.cards.len());
    column.cards.insert(at, card);
}

impl LayoutEngine {
    /// Place `count` equal-width columns across a board.
    pub fn column_layout(
        &self,
        board: Dimensions,
        count: usize,
    ) -> Result<ColumnLayout, LayoutError> {
        self.results
            .get_or_compute("column-layout", &(board, count), || {
                build_columns(board, count)
            })
    }

    /// Stack cards top to bottom inside a column, order preserved, widths
    /// clipped to the column's usable width.
    pub fn arrange_cards(
        &self,
        cards: &[TaskCard],
        column_bounds: &Rectangle,
    ) -> Result<Vec<TaskCardPosition>, LayoutError> {
        stack_cards(cards, column_bounds)
    }

    /// Apply card changes and re-stack only the columns they touched.
    pub fn handle_card_reflow(
        &self,
        layout: &ColumnLayout,
        changes: &[CardChange],
    ) -> Result<ColumnLayout, LayoutError> {
        let unknown_column = |id: &str| {
            LayoutError::invalid_input("card-reflow", format!("unknown column `{id}`"))
        };

        let mut result = layout.clone();
        let mut affected: Vec<String> = Vec::new();
        let mut touch = |affected: &mut Vec<String>, id: &str| {
            if !affected.iter().any(|a| a == id) {
                affected.push(id.to_string());
            }
        };

        for change in changes {
            match change {
                CardChange::Add {
                    column_id,
                    card,
                    position,
                } => {
                    let column = result
                        .column_mut(column_id)
                        .ok_or_else(|| unknown_column(column_id))?;
                    insert_card(
                        column,
                        TaskCardPosition {
                            task_id: card.id.clone(),
                            bounds: Rectangle {
                                origin: column.bounds.origin,
                                size: card.size,
                            },
                        },
                        *position,
                    );
                    touch(&mut affected, column_id);
                }
                CardChange::Remove { column_id, task_id } => {
                    let column = result
                        .column_mut(column_id)
                        .ok_or_else(|| unknown_column(column_id))?;
                    if take_card(column, task_id).is_none() {
                        tracing::debug!("card reflow: `{task_id}` not in `{column_id}`");
                    }
                    touch(&mut affected, column_id);
                }
                CardChange::Move {
                    task_id,
                    from_column,
                    to_column,
                    position,
                } => {
                    let source = result
                        .column_mut(from_column)
                        .ok_or_else(|| unknown_column(from_column))?;
                    let Some(card) = take_card(source, task_id) else {
                        return Err(LayoutError::invalid_input(
                            "card-reflow",
                            format!("card `{task_id}` not found in `{from_column}`"),
                        ));
                    };
                    let target = result
                        .column_mut(to_column)
                        .ok_or_else(|| unknown_column(to_column))?;
                    insert_card(target, card, *position);
                    touch(&mut affected, from_column);
                    touch(&mut affected, to_column);
                }
                CardChange::Resize {
                    column_id,
                    task_id,
                    size,
                } => {
                    let column = result
                        .column_mut(column_id)
                        .ok_or_else(|| unknown_column(column_id))?;
                    let Some(card) = column.cards.iter_mut().find(|c| c.task_id == *task_id)
                    else {
                        return Err(LayoutError::invalid_input(
                            "card-reflow",
                            format!("card `{task_id}` not found in `{column_id}`"),
                        ));
                    };
                    card.bounds.size = *size;
                    touch(&mut affected, column_id);
                }
            }
        }

        // Re-stack only what changed.
        for column_id in affected {
            let Some(column) = result.column_mut(&column_id) else {
                continue;
            };
            let cards: Vec<TaskCard> = column
                .cards
                .iter()
                .map(|c| TaskCard {
                    id: c.task_id.clone(),
                    size: c.bounds.size,
                })
                .collect();
            column.cards = stack_cards(&cards, &column.bounds)?;
        }
        Ok(result)
    }

    /// Scroll configuration: vertical always on, horizontal only when the
    /// board is wider than the viewport.
    pub fn optimize_scrolling(&self, layout: &ColumnLayout, viewport: Dimensions) -> ScrollConfig {
        ScrollConfig {
            vertical: true,
            horizontal: layout.total_width > viewport.width,
            speed: 1.0,
            viewport_bounds: Rectangle {
                origin: Default::default(),
                size: viewport,
            },
        }
    }
}

//! Nested conditional state

/// State of a conditional block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    /// The current branch is taken
    Active,
    /// No branch taken yet; a later `#elif` or `#else` may activate
    Inactive,
    /// A branch was already taken, or the enclosing block is inactive
    Skipped,
}

/// Conditional block on the stack
#[derive(Debug, Clone)]
struct ConditionalBlock {
    state: BlockState,
    /// Line number where the block started
    line: usize,
    seen_else: bool,
}

/// Stack of open `#if`/`#ifdef`/`#ifndef` blocks
///
/// Once a block is not active every block pushed above it is `Skipped`,
/// so the suppressed blocks always form the top of the stack.
#[derive(Debug, Clone, Default)]
pub struct ConditionalStack {
    blocks: Vec<ConditionalBlock>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Whether directives at the current position take effect
    pub fn is_active(&self) -> bool {
        self.blocks
            .last()
            .map_or(true, |block| block.state == BlockState::Active)
    }

    /// Number of open blocks whose branch is not taken
    pub fn inactive_depth(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| block.state != BlockState::Active)
            .count()
    }

    pub fn open_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Line of the innermost open block
    pub fn innermost_line(&self) -> Option<usize> {
        self.blocks.last().map(|block| block.line)
    }

    /// Open a block; `condition` only matters when the current position is active
    pub fn push(&mut self, condition: bool, line: usize) {
        let state = if !self.is_active() {
            BlockState::Skipped
        } else if condition {
            BlockState::Active
        } else {
            BlockState::Inactive
        };

        self.blocks.push(ConditionalBlock {
            state,
            line,
            seen_else: false,
        });
    }

    /// Whether an `#elif` here could still select its branch
    pub fn elif_pending(&self) -> bool {
        self.blocks
            .last()
            .map_or(false, |block| block.state == BlockState::Inactive && !block.seen_else)
    }

    /// Apply `#elif`; returns `false` with no open block or after `#else`
    pub fn elif(&mut self, condition: bool) -> bool {
        let Some(block) = self.blocks.last_mut() else {
            return false;
        };

        if block.seen_else {
            block.state = BlockState::Skipped;
            return false;
        }

        block.state = match block.state {
            BlockState::Active => BlockState::Skipped,
            BlockState::Inactive if condition => BlockState::Active,
            state => state,
        };
        true
    }

    /// Apply `#else`; returns `false` with no open block or on a second `#else`
    pub fn else_branch(&mut self) -> bool {
        let Some(block) = self.blocks.last_mut() else {
            return false;
        };

        if block.seen_else {
            block.state = BlockState::Skipped;
            return false;
        }

        block.seen_else = true;
        block.state = match block.state {
            BlockState::Active => BlockState::Skipped,
            BlockState::Inactive => BlockState::Active,
            BlockState::Skipped => BlockState::Skipped,
        };
        true
    }

    /// Apply `#endif`; returns `false` when no block is open
    pub fn endif(&mut self) -> bool {
        self.blocks.pop().is_some()
    }
}

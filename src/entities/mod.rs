pub mod block;
pub mod fireball;
pub mod player;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalDir {
    East,
    West,
}

impl HorizontalDir {
    pub fn invert(&self) -> HorizontalDir {
        match self {
            HorizontalDir::East => HorizontalDir::West,
            HorizontalDir::West => HorizontalDir::East,
        }
    }
}

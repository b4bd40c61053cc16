use console::{style, StyledObject};

pub fn warning<D>(msg: D) -> StyledObject<D> {
    style(msg).red().bold()
}

pub fn bold<D>(msg: D) -> StyledObject<D> {
    style(msg).bold()
}

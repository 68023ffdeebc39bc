mod r123;
mod r227ea;
mod undecane;

pub mod dataloader;
pub mod fashion_mnist;
pub mod npy;
pub mod quickdraw;

pub use dataloader::{DataLoader, Dataset};
pub use fashion_mnist::{FashionMnist, FashionMnistData};
pub use quickdraw::{Drawing, Split, CATEGORIES};

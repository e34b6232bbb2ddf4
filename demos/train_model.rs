use argbind::derive::Reflect;
use argbind::Binding;
use serde::Deserialize;

#[derive(Debug, Deserialize, Reflect)]
struct Adam {
    /// Step size.
    #[argbind(default = 0.001)]
    lr: f64,
    #[argbind(default = 0.9)]
    beta: f64,
}

#[derive(Debug, Deserialize, Reflect)]
struct Sgd {
    /// Step size.
    #[argbind(default = 0.01)]
    lr: f64,
    #[argbind(default)]
    momentum: f64,
}

#[derive(Debug, Deserialize, Reflect)]
#[serde(rename_all = "snake_case")]
enum Optimizer {
    Adam(Adam),
    Sgd(Sgd),
}

#[derive(Debug, Deserialize, Reflect)]
struct Train {
    /// Number of passes over the data.
    #[argbind(default = 10)]
    epochs: u32,
    /// Shuffle the data between epochs.
    #[argbind(default = true)]
    shuffle: bool,
    /// Hidden layer widths.
    #[argbind(default = vec![64, 32])]
    layers: Vec<u32>,
    optimizer: Optimizer,
    seed: Option<u64>,
}

fn main() -> Result<(), argbind::Error> {
    // $ train_model --optimizer sgd --optimizer-momentum 0.5 --no-shuffle
    let train: Train = Binding::of::<Train>()?.parse();
    println!("{train:#?}");
    Ok(())
}

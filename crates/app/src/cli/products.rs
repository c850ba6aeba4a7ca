use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use souq_app::{
    context::AppContext,
    domain::{
        catalog::{ProductFiltersUpdate, SortBy},
        products::records::{Product, ProductId},
    },
};

#[derive(Debug, Args)]
pub(crate) struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductsSubcommand {
    /// List products
    List(ListProductsArgs),

    /// Show one product
    Get(GetProductArgs),
}

#[derive(Debug, Args)]
struct ListProductsArgs {
    /// Free-text search; takes priority over --category
    #[arg(long)]
    search: Option<String>,

    /// Category label
    #[arg(long)]
    category: Option<String>,

    /// Sort order
    #[arg(long, value_enum)]
    sort: Option<SortBy>,

    /// Minimum price, inclusive
    #[arg(long)]
    min_price: Option<Decimal>,

    /// Maximum price, inclusive
    #[arg(long)]
    max_price: Option<Decimal>,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,
}

#[derive(Debug, Args)]
struct GetProductArgs {
    /// Product identifier
    id: ProductId,
}

pub(crate) async fn run(command: ProductsCommand, context: &AppContext) -> Result<(), String> {
    match command.command {
        ProductsSubcommand::List(args) => list(args, context).await,
        ProductsSubcommand::Get(args) => get(args, context).await,
    }
}

pub(crate) async fn categories(context: &AppContext) -> Result<(), String> {
    for category in context.catalog.fetch_categories().await {
        println!("{category}");
    }

    Ok(())
}

async fn list(args: ListProductsArgs, context: &AppContext) -> Result<(), String> {
    let catalog = &context.catalog;

    catalog
        .set_filters(ProductFiltersUpdate {
            search: args.search,
            category: args.category,
            min_price: args.min_price,
            max_price: args.max_price,
            sort_by: args.sort,
        })
        .await;

    for _ in 1..args.pages {
        if !catalog.load_more().await {
            break;
        }
    }

    let snapshot = catalog.snapshot();

    if let Some(error) = snapshot.error {
        return Err(format!("failed to list products: {error}"));
    }

    for product in &snapshot.products {
        print_row(product, context.favorites.is_favorite(product.id));
    }

    println!(
        "showing {} of {} (sorted by {}{})",
        snapshot.products.len(),
        snapshot.total,
        snapshot.filters.sort_by,
        if snapshot.has_more { ", more available" } else { "" }
    );

    Ok(())
}

async fn get(args: GetProductArgs, context: &AppContext) -> Result<(), String> {
    context.catalog.fetch_product(args.id).await;

    let snapshot = context.catalog.snapshot();

    if let Some(error) = snapshot.product_error {
        return Err(format!("failed to fetch product {}: {error}", args.id));
    }

    let Some(product) = snapshot.current_product else {
        return Err(format!("product {} not found", args.id));
    };

    println!("id: {}", product.id);
    println!("title: {}", product.title);
    println!("brand: {}", product.brand);
    println!("category: {}", product.category);
    println!("price: {}", product.price);
    println!("discount: {}%", product.discount_percentage);
    println!("rating: {}", product.rating);
    println!("stock: {}", product.stock);
    println!("favorite: {}", context.favorites.is_favorite(product.id));
    println!("description: {}", product.description);

    for image in &product.images {
        println!("image: {image}");
    }

    Ok(())
}

fn print_row(product: &Product, favorite: bool) {
    println!(
        "{}\t{}\t{}\t{:.1}{}",
        product.id,
        product.title,
        product.price,
        product.rating,
        if favorite { "\t*" } else { "" }
    );
}
